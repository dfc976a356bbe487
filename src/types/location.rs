/// Site the forcing series is built for.
///
/// # Examples
///
/// ```
/// use metforce::Location;
///
/// let albuquerque = Location::new(35.0844, -106.6504).with_elevation(1619.0);
/// assert_eq!(albuquerque.latitude, 35.0844);
/// assert_eq!(albuquerque.elevation, 1619.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level.
    pub elevation: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: 0.0,
        }
    }

    pub fn with_elevation(self, elevation: f64) -> Self {
        Self { elevation, ..self }
    }
}
