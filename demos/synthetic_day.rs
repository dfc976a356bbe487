//! Fuses one synthetic summer day: a 10-minute station record with an outage, an hourly
//! reanalysis product and a toy sun model. Run with `RUST_LOG=debug` to see how every parameter
//! was resolved.

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use metforce::{
    GriddedSample, Location, Metforce, MetforceError, RunConfig, SolarPosition, SourceError,
    SourceTable, TimeRange, TimeSeries,
};
use std::env;
use std::f64::consts::PI;

const CONFIG: &str = r#"{
    "latitude": 35.0844, "longitude": -106.6504, "elevation": 1619,
    "start_range": "2023-06-21 00:00", "end_range": "2023-06-21 23:00",
    "freq": "1H", "metstation_freq": "5T", "interp_method": "linear",
    "metfile": "synthetic-station.xlsx",
    "location_name": "Synthetic site",
    "parameters": {
        "wind_speed": {"source": "gridded"},
        "wind_direction": {"source": "gridded"},
        "downwelling_lwir": {"source": "brunt"},
        "direct_shortwave": {"source": "global_75%"},
        "diffuse_shortwave": {"source": "global_25%"}
    }
}"#;

fn daylight(ts: NaiveDateTime) -> f64 {
    let hour = ts.hour() as f64 + ts.minute() as f64 / 60.0;
    ((hour - 6.0) / 14.0 * PI).sin().max(0.0)
}

fn station_sheet(range: &TimeRange) -> Result<SourceTable, SourceError> {
    let mut times = Vec::new();
    // The logger went offline at 20:00; the rest of the day comes from the reanalysis.
    let mut ts = range.start() - TimeDelta::hours(1);
    while ts < range.start() + TimeDelta::hours(20) {
        times.push(ts);
        ts += TimeDelta::minutes(10);
    }
    let column = |f: &dyn Fn(NaiveDateTime) -> f64| {
        TimeSeries::from_points(times.iter().map(|ts| (*ts, Some(f(*ts)))))
    };
    Ok(SourceTable::new()
        .with_column("BP_mbar", column(&|_| 835.0)?)
        .with_column("AirT_2M", column(&|ts| 18.0 + 12.0 * daylight(ts))?)
        .with_column("RH_2M", column(&|ts| 55.0 - 30.0 * daylight(ts))?)
        .with_column("Precip_Tot", column(&|ts| if ts.hour() == 17 { 0.2 } else { 0.0 })?)
        // The pyranometer reads slightly negative at night.
        .with_column("PSP_Total", column(&|ts| 1050.0 * daylight(ts) - 2.0)?))
}

fn reanalysis(range: &TimeRange) -> Result<SourceTable, SourceError> {
    let samples: Vec<GriddedSample> = range
        .grid(metforce::Frequency::hours(1))
        .into_iter()
        .map(|timestamp| GriddedSample {
            timestamp,
            temperature_k: 291.0 + 11.0 * daylight(timestamp),
            specific_humidity: 0.006,
            surface_pressure_pa: 83_600.0,
            zonal_wind: 2.0 + 3.0 * daylight(timestamp),
            meridional_wind: -1.5,
            shortwave_down: 1000.0 * daylight(timestamp),
            longwave_down: 320.0,
            precipitation: 0.0,
        })
        .collect();
    GriddedSample::to_table(&samples)
}

fn toy_sun(range: &TimeRange, _: &Location) -> Result<SolarPosition, SourceError> {
    let grid = range.grid(metforce::Frequency::hours(1));
    let zenith = TimeSeries::from_points(
        grid.iter()
            .map(|ts| (*ts, Some(90.0 - 78.0 * daylight(*ts)))),
    )?;
    let azimuth = TimeSeries::from_points(
        grid.iter()
            .map(|ts| (*ts, Some(60.0 + 240.0 * ts.hour() as f64 / 23.0))),
    )?;
    Ok(SolarPosition { zenith, azimuth })
}

fn main() -> Result<(), MetforceError> {
    env_logger::init();
    configure_polars_display();

    let config = RunConfig::from_json_str(CONFIG)?;
    let run = Metforce::from_config(&config)?;
    let range = run.time_range();

    let station = station_sheet(&range)?;
    let gridded = reanalysis(&range)?;
    let tables = run
        .gather()
        .station(&station)
        .gridded(&gridded)
        .solar(&toy_sun)
        .fill_station_gaps(true)
        .call()?;

    let alignment = run.run(&tables)?;
    for warning in &alignment.warnings {
        println!("warning: {}", warning);
    }

    let afternoon = alignment
        .table
        .into_lazy()
        .get_range("2023-06-21 12:00", "2023-06-21 18:00")?
        .frame
        .collect()?;
    println!("{}", afternoon);

    Ok(())
}

fn configure_polars_display() {
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "24");
}
