//! Standard forcing parameters and where they come from when a configuration is silent.

pub const PRESSURE: &str = "pressure";
pub const TEMPERATURE: &str = "temperature";
pub const RELATIVE_HUMIDITY: &str = "relative_humidity";
pub const WIND_SPEED: &str = "wind_speed";
pub const WIND_DIRECTION: &str = "wind_direction";
pub const PRECIPITATION: &str = "precipitation";
pub const GLOBAL_SHORTWAVE: &str = "global_shortwave";
pub const DIFFUSE_SHORTWAVE: &str = "diffuse_shortwave";
pub const DIRECT_SHORTWAVE: &str = "direct_shortwave";
pub const DOWNWELLING_LWIR: &str = "downwelling_lwir";
pub const ZENITH: &str = "zenith";
pub const AZIMUTH: &str = "azimuth";

/// Output column order of the forcing file.
pub const STANDARD_PARAMETERS: [&str; 12] = [
    PRESSURE,
    TEMPERATURE,
    RELATIVE_HUMIDITY,
    WIND_SPEED,
    WIND_DIRECTION,
    PRECIPITATION,
    GLOBAL_SHORTWAVE,
    DIFFUSE_SHORTWAVE,
    DIRECT_SHORTWAVE,
    DOWNWELLING_LWIR,
    ZENITH,
    AZIMUTH,
];

/// Column header used for a parameter in the met-station spreadsheet.
pub fn default_station_key(parameter: &str) -> Option<&'static str> {
    match parameter {
        PRESSURE => Some("BP_mbar"),
        TEMPERATURE => Some("AirT_2M"),
        RELATIVE_HUMIDITY => Some("RH_2M"),
        WIND_SPEED => Some("Wind_Spd_2M"),
        WIND_DIRECTION => Some("Wind_Dir_2M"),
        PRECIPITATION => Some("Precip_Tot"),
        GLOBAL_SHORTWAVE => Some("PSP_Total"),
        DIFFUSE_SHORTWAVE => Some("Diffuse"),
        DIRECT_SHORTWAVE => Some("Direct"),
        DOWNWELLING_LWIR => Some("PIR_Flux"),
        ZENITH => Some("ZenDeg"),
        AZIMUTH => Some("AzDeg"),
        _ => None,
    }
}

/// Default source spelling for a standard parameter.
///
/// With a station file everything measurable comes from the station; without one the
/// gridded product is used instead. Shortwave components and sun angles are the same
/// either way.
pub fn default_source(parameter: &str, with_station: bool) -> Option<&'static str> {
    let measured = if with_station { "station" } else { "gridded" };
    match parameter {
        PRESSURE | TEMPERATURE | RELATIVE_HUMIDITY | WIND_SPEED | WIND_DIRECTION
        | PRECIPITATION | GLOBAL_SHORTWAVE | DOWNWELLING_LWIR => Some(measured),
        DIFFUSE_SHORTWAVE => Some("global_20%"),
        DIRECT_SHORTWAVE => Some("global_80%"),
        ZENITH | AZIMUTH => Some("solar"),
        _ => None,
    }
}

/// Position in [`STANDARD_PARAMETERS`]; unknown names sort after all standard ones.
pub fn output_rank(parameter: &str) -> usize {
    STANDARD_PARAMETERS
        .iter()
        .position(|p| *p == parameter)
        .unwrap_or(STANDARD_PARAMETERS.len())
}
