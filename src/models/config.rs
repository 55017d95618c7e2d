//! Конфигурация моста (config.json).
//! schemaVersion: 1

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

const CONFIG_DIR_NAME: &str = "HeadNav";
const CONFIG_FILE_NAME: &str = "config.json";

/// Профиль времени удержания: быстрый набор или точное наведение.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DwellPreset {
    Fast,
    #[default]
    Precise,
}

/// Параметры dwell-контроллера.
///
/// Значения по умолчанию — константы «точного» профиля; `fast()` даёт
/// укороченный профиль для беглого набора.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DwellConfig {
    /// Сколько курсор должен простоять на захваченной цели до активации.
    pub dwell_time_ms: u64,
    /// Минимальный интервал между двумя активациями.
    pub cooldown_ms: u64,
    /// Максимальный дрейф от точки захвата, после которого захват снимается.
    pub unlock_radius_px: f64,
    /// Сколько кандидат должен продержаться в hit-test до захвата.
    pub stabilization_ms: u64,
    /// Требовать уход курсора с цели перед повторной активацией той же цели.
    pub require_move_to_reactivate: bool,
    /// Калибровочное смещение, добавляемое после проекции координат.
    pub x_offset: f64,
    pub y_offset: f64,
    /// Частота проброса pointer-move в целевую поверхность.
    pub move_event_hz: f64,
    /// Возраст отсчёта трекера, после которого сигнал считается протухшим.
    pub signal_stale_ms: u64,
}

impl Default for DwellConfig {
    fn default() -> Self {
        Self {
            dwell_time_ms: 1_500,
            cooldown_ms: 650,
            unlock_radius_px: 22.0,
            stabilization_ms: 140,
            require_move_to_reactivate: true,
            x_offset: 0.0,
            y_offset: 0.0,
            move_event_hz: 30.0,
            signal_stale_ms: 800,
        }
    }
}

impl DwellConfig {
    /// Укороченный профиль для беглого набора.
    pub fn fast() -> Self {
        Self {
            dwell_time_ms: 700,
            cooldown_ms: 600,
            ..Self::default()
        }
    }

    pub fn preset(preset: DwellPreset) -> Self {
        match preset {
            DwellPreset::Fast => Self::fast(),
            DwellPreset::Precise => Self::default(),
        }
    }
}

/// Корневой контейнер файла config.json.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    pub schema_version: u32,
    pub preset: DwellPreset,
    pub dwell: DwellConfig,
    /// Частота кадрового цикла моста.
    pub frame_rate_hz: f64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            preset: DwellPreset::default(),
            dwell: DwellConfig::default(),
            frame_rate_hz: 60.0,
        }
    }
}

/// Загружает конфигурацию из стандартного пути.
///
/// Отсутствующий файл — не ошибка: возвращается конфигурация по умолчанию.
pub fn load_config() -> Result<BridgeConfig, String> {
    let path = config_file()?;
    if !path.exists() {
        log::info!("load_config: {} absent, using defaults", path.display());
        return Ok(BridgeConfig::default());
    }

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let config: BridgeConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))?;

    if config.schema_version != SCHEMA_VERSION {
        return Err(format!(
            "Unsupported config schemaVersion: expected {}, got {}",
            SCHEMA_VERSION, config.schema_version
        ));
    }

    log::info!("load_config: path={}", path.display());
    Ok(config)
}

/// Сохраняет конфигурацию в стандартный путь.
pub fn save_config(config: &BridgeConfig) -> Result<String, String> {
    if config.schema_version != SCHEMA_VERSION {
        return Err(format!(
            "Refusing to save unsupported schemaVersion: {}",
            config.schema_version
        ));
    }

    let path = config_file()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            format!(
                "Failed to create config directory {}: {e}",
                parent.display()
            )
        })?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;
    std::fs::write(&path, json)
        .map_err(|e| format!("Failed to write config file {}: {e}", path.display()))?;

    log::info!("save_config: path={}", path.display());
    Ok(path.to_string_lossy().to_string())
}

fn config_file() -> Result<PathBuf, String> {
    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .ok_or("Failed to resolve config directory")?;
    Ok(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
