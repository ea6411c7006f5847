/// Coordinate reference systems the viewer understands, keyed by their
/// geoide identifier strings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Crs {
    Wgs84,
    Mars2000,
    Moon2000,
    Sun,
    Equatorial,
    Galactic,
    HorizontalLocal,
}

/// Rendering context derived from the CRS. Decides which view options
/// apply (e.g. a camera distance for planets, a field of view for the sky).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Context {
    Planet,
    Sky,
    Ground,
}

impl Crs {
    pub const ALL: [Crs; 7] = [
        Crs::Wgs84,
        Crs::Mars2000,
        Crs::Moon2000,
        Crs::Sun,
        Crs::Equatorial,
        Crs::Galactic,
        Crs::HorizontalLocal,
    ];

    /// Identifier strings, index-aligned with `ALL`.
    pub const IDENTS: [&'static str; 7] = [
        "CRS:84",
        "IAU2000:49901",
        "IAU2000:30101",
        "IAU:Sun",
        "Equatorial",
        "Galactic",
        "HorizontalLocal",
    ];

    pub fn ident(self) -> &'static str {
        match self {
            Crs::Wgs84 => "CRS:84",
            Crs::Mars2000 => "IAU2000:49901",
            Crs::Moon2000 => "IAU2000:30101",
            Crs::Sun => "IAU:Sun",
            Crs::Equatorial => "Equatorial",
            Crs::Galactic => "Galactic",
            Crs::HorizontalLocal => "HorizontalLocal",
        }
    }

    /// Fixed CRS → context table.
    pub fn context(self) -> Context {
        match self {
            Crs::Wgs84 | Crs::Mars2000 | Crs::Moon2000 | Crs::Sun => Context::Planet,
            Crs::Equatorial | Crs::Galactic => Context::Sky,
            Crs::HorizontalLocal => Context::Ground,
        }
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.ident())
    }
}

/// Returned when an identifier string names no known CRS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCrs(pub String);

impl std::fmt::Display for UnknownCrs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown CRS identifier: {}", self.0)
    }
}

impl std::error::Error for UnknownCrs {}

impl std::str::FromStr for Crs {
    type Err = UnknownCrs;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Crs::ALL
            .into_iter()
            .find(|crs| crs.ident() == s)
            .ok_or_else(|| UnknownCrs(s.to_string()))
    }
}

impl Context {
    pub fn name(self) -> &'static str {
        match self {
            Context::Planet => "Planet",
            Context::Sky => "Sky",
            Context::Ground => "Ground",
        }
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::{Context, Crs};

    #[test]
    fn idents_round_trip() {
        for crs in Crs::ALL {
            assert_eq!(crs.ident().parse::<Crs>().unwrap(), crs);
        }
    }

    #[test]
    fn unknown_ident_is_an_error() {
        assert!("EPSG:3857".parse::<Crs>().is_err());
    }

    #[test]
    fn context_table() {
        assert_eq!(Crs::Wgs84.context(), Context::Planet);
        assert_eq!(Crs::Mars2000.context(), Context::Planet);
        assert_eq!(Crs::Equatorial.context(), Context::Sky);
        assert_eq!(Crs::Galactic.context(), Context::Sky);
        assert_eq!(Crs::HorizontalLocal.context(), Context::Ground);
    }
}
