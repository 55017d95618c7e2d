//! Нативный адаптер поверхности: Windows UI Automation + синтез ввода.
//!
//! Запросы (hit-test, роли, геометрия) идут через UIA; активация
//! синтезируется enigo. Любая ошибка COM/UIA даёт `Err`/`None` на границе
//! адаптера и перехватывается кадровым циклом. Паники внутри COM
//! оборачиваются в `catch_unwind`.

use std::cell::Cell;
use std::panic::AssertUnwindSafe;

use uiautomation::{UIAutomation, UIElement};

use crate::algorithm::caret::{caret_offset_at_point, FixedAdvanceMeasure};
use crate::models::geometry::{Point, Rect, ViewportSize};
use crate::surface::{ActivationOutcome, InteractionSurface, SurfaceError, TargetKind};

// Идентификаторы типов контролов UIA (UIAutomationClient.h).
const UIA_BUTTON: i32 = 50_000;
const UIA_CHECKBOX: i32 = 50_002;
const UIA_COMBOBOX: i32 = 50_003;
const UIA_EDIT: i32 = 50_004;
const UIA_HYPERLINK: i32 = 50_005;
const UIA_LIST_ITEM: i32 = 50_007;
const UIA_LIST: i32 = 50_008;
const UIA_MENU_ITEM: i32 = 50_011;
const UIA_RADIO_BUTTON: i32 = 50_013;
const UIA_TAB_ITEM: i32 = 50_019;
const UIA_DOCUMENT: i32 = 50_030;
const UIA_SPLIT_BUTTON: i32 = 50_031;

/// Каждые столько hit-test-ов адаптер поднимает ревизию, заставляя
/// контроллер перепроверить удерживаемые ссылки (ограниченный polling
/// вместо подписки на события UIA).
const REVALIDATE_EVERY_FRAMES: u64 = 30;

/// Пределы клавиатурной расстановки каретки.
const MAX_CARET_KEY_STEPS: usize = 400;
const ESTIMATED_LINE_HEIGHT_PX: f64 = 18.0;
const ESTIMATED_CHAR_WIDTH_PX: f64 = 7.0;

/// Предел обхода дочерних элементов при сборе опций списка.
const MAX_LIST_OPTIONS: usize = 64;

/// Элемент дерева UIA с идентичностью по runtime id.
#[derive(Clone)]
pub struct UiaNode {
    element: UIElement,
    runtime_id: Vec<i32>,
}

impl PartialEq for UiaNode {
    fn eq(&self, other: &Self) -> bool {
        self.runtime_id == other.runtime_id
    }
}

impl std::fmt::Debug for UiaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiaNode")
            .field("runtime_id", &self.runtime_id)
            .finish()
    }
}

/// Поверхность рабочего стола Windows как `InteractionSurface`.
pub struct UiaSurface {
    automation: UIAutomation,
    enigo: enigo::Enigo,
    frames: Cell<u64>,
    revision: Cell<u64>,
}

impl UiaSurface {
    pub fn new() -> Result<Self, String> {
        let automation = UIAutomation::new()
            .map_err(|e| format!("Failed to initialize UI Automation: {e}"))?;
        let enigo = enigo::Enigo::new(&enigo::Settings::default())
            .map_err(|e| format!("Failed to initialize input synthesis: {e}"))?;

        Ok(Self {
            automation,
            enigo,
            frames: Cell::new(0),
            revision: Cell::new(0),
        })
    }

    fn wrap(&self, element: UIElement) -> Option<UiaNode> {
        let runtime_id = element.get_runtime_id().ok()?;
        Some(UiaNode {
            element,
            runtime_id,
        })
    }

    /// Ровно один синтетический клик в точке — без каскада
    /// pointerdown/up, который при dwell-повторении даёт двойные срабатывания.
    fn click_at(&mut self, point: Point) -> Result<(), SurfaceError> {
        use enigo::{Coordinate, Direction, Mouse};

        self.enigo
            .move_mouse(point.x as i32, point.y as i32, Coordinate::Abs)
            .map_err(|e| SurfaceError::Dispatch(format!("move failed: {e}")))?;
        self.enigo
            .button(enigo::Button::Left, Direction::Click)
            .map_err(|e| SurfaceError::Dispatch(format!("click failed: {e}")))?;
        Ok(())
    }

    fn press(&mut self, key: enigo::Key) -> Result<(), SurfaceError> {
        use enigo::{Direction, Keyboard};

        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| SurfaceError::Dispatch(format!("key failed: {e}")))
    }

    /// Клавиатурная расстановка каретки по оценённому смещению — резерв на
    /// случай, когда клик не прошёл, а нативного point→offset у контрола нет.
    fn place_caret_by_keys(&mut self, node: &UiaNode, point: Point) -> Result<(), SurfaceError> {
        let text = guarded(|| node.element.get_name().ok())
            .flatten()
            .unwrap_or_default();
        let rect = self
            .node_rect_of(node)
            .unwrap_or_else(|| Rect::new(point.x, point.y, 1.0, 1.0));

        let measure = FixedAdvanceMeasure {
            char_width: ESTIMATED_CHAR_WIDTH_PX,
        };
        let offset = caret_offset_at_point(&text, rect, point, ESTIMATED_LINE_HEIGHT_PX, &measure)
            .min(MAX_CARET_KEY_STEPS);

        use enigo::{Direction, Keyboard};
        self.enigo
            .key(enigo::Key::Control, Direction::Press)
            .map_err(|e| SurfaceError::Dispatch(format!("key failed: {e}")))?;
        let home = self.press(enigo::Key::Home);
        self.enigo
            .key(enigo::Key::Control, Direction::Release)
            .map_err(|e| SurfaceError::Dispatch(format!("key failed: {e}")))?;
        home?;

        for _ in 0..offset {
            self.press(enigo::Key::RightArrow)?;
        }
        Ok(())
    }

    fn node_rect_of(&self, node: &UiaNode) -> Option<Rect> {
        let rect = guarded(|| node.element.get_bounding_rectangle().ok()).flatten()?;
        Some(Rect::new(
            rect.get_left() as f64,
            rect.get_top() as f64,
            (rect.get_right() - rect.get_left()).max(0) as f64,
            (rect.get_bottom() - rect.get_top()).max(0) as f64,
        ))
    }

    /// Собирает подписи опций селектора через обход дочерних элементов.
    fn list_options(&self, node: &UiaNode) -> Result<Vec<String>, SurfaceError> {
        let walker = self
            .automation
            .get_raw_view_walker()
            .map_err(|e| SurfaceError::HitTest(format!("tree walker unavailable: {e}")))?;

        let mut options = Vec::new();
        let mut queue = vec![node.element.clone()];

        while let Some(parent) = queue.pop() {
            let mut child = guarded(|| walker.get_first_child(&parent).ok()).flatten();
            while let Some(current) = child {
                if options.len() >= MAX_LIST_OPTIONS {
                    return Ok(options);
                }

                match guarded(|| current.get_control_type().ok()).flatten() {
                    Some(UIA_LIST_ITEM) => {
                        if let Some(name) = guarded(|| current.get_name().ok()).flatten() {
                            if !name.is_empty() {
                                options.push(name);
                            }
                        }
                    }
                    // Раскрытый комбобокс держит опции во вложенном списке.
                    Some(UIA_LIST) => queue.push(current.clone()),
                    _ => {}
                }

                child = guarded(|| walker.get_next_sibling(&current).ok()).flatten();
            }
        }

        Ok(options)
    }
}

impl InteractionSurface for UiaSurface {
    type Node = UiaNode;

    fn is_ready(&self) -> bool {
        guarded(|| self.automation.get_root_element().is_ok()).unwrap_or(false)
    }

    fn viewport(&self) -> ViewportSize {
        use windows::Win32::UI::WindowsAndMessaging::{
            GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN,
        };

        let width = unsafe { GetSystemMetrics(SM_CXVIRTUALSCREEN) };
        let height = unsafe { GetSystemMetrics(SM_CYVIRTUALSCREEN) };
        ViewportSize::new(width as f64, height as f64)
    }

    fn topmost_at(&self, point: Point) -> Result<Option<UiaNode>, SurfaceError> {
        let frames = self.frames.get().wrapping_add(1);
        self.frames.set(frames);
        if frames % REVALIDATE_EVERY_FRAMES == 0 {
            self.revision.set(self.revision.get().wrapping_add(1));
        }

        let uia_point = uiautomation::types::Point::new(point.x as i32, point.y as i32);
        let element = guarded(|| self.automation.element_from_point(uia_point))
            .ok_or_else(|| SurfaceError::HitTest("panic inside UIA".to_string()))?;

        match element {
            Ok(element) => Ok(self.wrap(element)),
            Err(e) => Err(SurfaceError::HitTest(format!("element_from_point: {e}"))),
        }
    }

    fn parent(&self, node: &UiaNode) -> Option<UiaNode> {
        let walker = self.automation.get_raw_view_walker().ok()?;
        let parent = guarded(|| walker.get_parent(&node.element).ok()).flatten()?;
        self.wrap(parent)
    }

    fn interactive_kind(&self, node: &UiaNode) -> Option<TargetKind> {
        let enabled = guarded(|| node.element.is_enabled().unwrap_or(true)).unwrap_or(true);
        if !enabled {
            return None;
        }

        let control_type = guarded(|| node.element.get_control_type().ok()).flatten()?;
        match control_type {
            UIA_BUTTON => Some(TargetKind::Button),
            UIA_HYPERLINK => Some(TargetKind::Link),
            UIA_EDIT => {
                let classname = guarded(|| node.element.get_classname().ok())
                    .flatten()
                    .unwrap_or_default();
                if classname.to_ascii_lowercase().contains("richedit") {
                    Some(TargetKind::TextArea)
                } else {
                    Some(TargetKind::TextInput)
                }
            }
            UIA_DOCUMENT => Some(TargetKind::ContentEditable),
            UIA_COMBOBOX | UIA_LIST => Some(TargetKind::SelectList),
            UIA_CHECKBOX | UIA_RADIO_BUTTON | UIA_MENU_ITEM | UIA_TAB_ITEM | UIA_SPLIT_BUTTON => {
                Some(TargetKind::GenericClickable)
            }
            _ => None,
        }
    }

    fn node_rect(&self, node: &UiaNode) -> Option<Rect> {
        self.node_rect_of(node)
    }

    fn node_alive(&self, node: &UiaNode) -> bool {
        guarded(|| node.element.get_runtime_id().is_ok()).unwrap_or(false)
    }

    fn revision(&self) -> u64 {
        self.revision.get()
    }

    fn pointer_moved(&mut self, point: Point) {
        use enigo::{Coordinate, Mouse};

        // Зеркалим спроецированную точку в системный указатель, чтобы
        // hover-аффордансы целевой поверхности оставались живыми.
        if let Err(e) = self
            .enigo
            .move_mouse(point.x as i32, point.y as i32, Coordinate::Abs)
        {
            log::debug!("uia: pointer move failed: {e}");
        }
    }

    fn set_highlight(&mut self, node: &UiaNode, on: bool) {
        // Оверлей подсветки рисует хост; адаптер только журналирует.
        log::debug!("uia: highlight {:?} -> {on}", node.runtime_id);
    }

    fn activate(
        &mut self,
        node: &UiaNode,
        kind: TargetKind,
        point: Point,
    ) -> Result<ActivationOutcome, SurfaceError> {
        match kind {
            TargetKind::Button | TargetKind::Link | TargetKind::GenericClickable => {
                self.click_at(point)?;
                Ok(ActivationOutcome::Dispatched)
            }
            TargetKind::TextInput | TargetKind::TextArea | TargetKind::ContentEditable => {
                guarded(|| node.element.set_focus())
                    .ok_or_else(|| SurfaceError::Dispatch("panic inside UIA".to_string()))?
                    .map_err(|e| SurfaceError::Dispatch(format!("focus failed: {e}")))?;

                if let Err(click_err) = self.click_at(point) {
                    log::debug!("uia: click failed, placing caret by keys: {click_err}");
                    self.place_caret_by_keys(node, point)?;
                }
                Ok(ActivationOutcome::Dispatched)
            }
            TargetKind::SelectList => {
                let options = self.list_options(node)?;
                Ok(ActivationOutcome::NeedsOptionPicker(options))
            }
        }
    }

    fn commit_option(&mut self, node: &UiaNode, index: usize) -> Result<(), SurfaceError> {
        guarded(|| node.element.set_focus())
            .ok_or_else(|| SurfaceError::Dispatch("panic inside UIA".to_string()))?
            .map_err(|e| SurfaceError::Dispatch(format!("focus failed: {e}")))?;

        // Детерминированный клавиатурный выбор вместо ненадёжных синтетических
        // кликов по нативному попапу.
        self.press(enigo::Key::Home)?;
        for _ in 0..index {
            self.press(enigo::Key::DownArrow)?;
        }
        self.press(enigo::Key::Return)
    }
}

/// Перехватывает паники внутри COM/UIA, как это делает сборщик UI-контекста.
fn guarded<T>(op: impl FnOnce() -> T) -> Option<T> {
    std::panic::catch_unwind(AssertUnwindSafe(op)).ok()
}
