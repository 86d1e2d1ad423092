//! Code-to-name lookup tables
//!
//! The remote service identifies cars and series by numeric code. Names are
//! resolved through a [`LookupService`] so the tables can be replaced without
//! touching payload normalization. Unknown codes resolve to [`UNKNOWN`].

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::LookupError;

/// Name used for codes missing from the tables
pub const UNKNOWN: &str = "Unknown";

/// Version label of the tables compiled into the crate
pub const BUILTIN_VERSION: &str = "builtin-2023";

/// Resolves numeric codes to display names
pub trait LookupService {
    /// Car name for a car code
    fn car_name(&self, car_id: u32) -> Option<&str>;

    /// Series name for a series code
    fn series_name(&self, series_id: u32) -> Option<&str>;

    /// Label identifying which table data is in use
    fn version(&self) -> &str;

    /// Car name, or [`UNKNOWN`]
    fn resolve_car(&self, car_id: u32) -> String {
        self.car_name(car_id).unwrap_or(UNKNOWN).to_string()
    }

    /// Series name, or [`UNKNOWN`]
    fn resolve_series(&self, series_id: u32) -> String {
        self.series_name(series_id).unwrap_or(UNKNOWN).to_string()
    }
}

/// Immutable car and series tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTables {
    version: String,
    cars: HashMap<u32, String>,
    series: HashMap<u32, String>,
}

/// On-disk override document
#[derive(Debug, Deserialize)]
struct OverrideFile {
    version: Option<String>,
    #[serde(default)]
    cars: HashMap<u32, String>,
    #[serde(default)]
    series: HashMap<u32, String>,
}

impl LookupTables {
    /// Tables shipped with the crate
    pub fn builtin() -> Self {
        let collect = |table: &[(u32, &str)]| -> HashMap<u32, String> {
            table
                .iter()
                .map(|(id, name)| (*id, (*name).to_string()))
                .collect()
        };
        Self {
            version: BUILTIN_VERSION.to_string(),
            cars: collect(BUILTIN_CARS),
            series: collect(BUILTIN_SERIES),
        }
    }

    /// Built-in tables with the entries of a JSON override file merged on top.
    ///
    /// ```text
    /// { "version": "2024S2", "cars": { "188": "McLaren 720S GT3 EVO" }, "series": { ... } }
    /// ```
    pub fn load_overrides(path: &Path) -> Result<Self, LookupError> {
        let content = fs::read_to_string(path)?;
        let overrides: OverrideFile = serde_json::from_str(&content)?;
        Ok(Self::builtin().merged(overrides))
    }

    fn merged(mut self, overrides: OverrideFile) -> Self {
        tracing::debug!(
            "Applying {} car and {} series lookup overrides",
            overrides.cars.len(),
            overrides.series.len()
        );
        self.cars.extend(overrides.cars);
        self.series.extend(overrides.series);
        if let Some(version) = overrides.version {
            self.version = version;
        }
        self
    }

    /// Number of known cars
    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    /// Number of known series
    pub fn series_count(&self) -> usize {
        self.series.len()
    }
}

impl Default for LookupTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LookupService for LookupTables {
    fn car_name(&self, car_id: u32) -> Option<&str> {
        self.cars.get(&car_id).map(String::as_str)
    }

    fn series_name(&self, series_id: u32) -> Option<&str> {
        self.series.get(&series_id).map(String::as_str)
    }

    fn version(&self) -> &str {
        &self.version
    }
}

static BUILTIN_CARS: &[(u32, &str)] = &[
    (1, "Skip Barber Formula 2000"),
    (2, "Modified - SK"),
    (3, "Pontiac Solstice"),
    (4, "[Legacy] Pro Mazda"),
    (5, "Legends Ford '34 Coupe"),
    (10, "Pontiac Solstice - Rookie"),
    (11, "Legends Ford '34 Coupe - Rookie"),
    (12, "[Retired] - Chevrolet Monte Carlo SS"),
    (13, "Radical SR8"),
    (18, "Silver Crown"),
    (20, "[Legacy] NASCAR Truck Chevrolet Silverado - 2008"),
    (21, "[Legacy] Riley MkXX Daytona Prototype - 2008"),
    (22, "[Legacy] NASCAR Cup Chevrolet Impala COT - 2009"),
    (23, "SCCA Spec Racer Ford"),
    (24, "ARCA Menards Chevrolet Impala"),
    (25, "Lotus 79"),
    (26, "Chevrolet Corvette C6.R GT1"),
    (27, "VW Jetta TDI Cup"),
    (28, "[Legacy] V8 Supercar Ford Falcon - 2009"),
    (29, "[Legacy] Dallara IR-05"),
    (30, "Ford Mustang FR500S"),
    (31, "Modified - NASCAR Whelen Tour"),
    (33, "Williams-Toyota FW31"),
    (34, "[Legacy] Mazda MX-5 Cup - 2010"),
    (35, "[Legacy] Mazda MX-5 Roadster - 2010"),
    (36, "Street Stock"),
    (37, "Sprint Car"),
    (38, "[Legacy] NASCAR Nationwide Chevrolet Impala - 2012"),
    (39, "HPD ARX-01c"),
    (41, "Cadillac CTS-V Racecar"),
    (43, "McLaren MP4-12C GT3"),
    (44, "Kia Optima"),
    (59, "Ford GT GT3"),
    (67, "Global Mazda MX-5 Cup"),
    (128, "Dallara P217"),
    (132, "BMW M4 GT3"),
    (148, "FIA F4"),
    (157, "Mercedes-AMG GT4"),
    (159, "BMW M Hybrid V8"),
    (160, "Toyota GR86"),
    (169, "Porsche 911 GT3 R (992)"),
    (173, "Ferrari 296 GT3"),
    (176, "Audi R8 LMS EVO II GT3"),
];

static BUILTIN_SERIES: &[(u32, &str)] = &[
    (32, "Advanced Legends Cup"),
    (33, "iRacing Late Model Tour"),
    (34, "Skip Barber Race Series"),
    (45, "SK Modified Weekly Series"),
    (47, "NASCAR iRacing Class C"),
    (53, "Silver Crown Cup"),
    (58, "NASCAR Class A"),
    (62, "NASCAR iRacing Class B"),
    (63, "Spec Racer Ford Challenge"),
    (65, "Classic Lotus Grand Prix"),
    (74, "Radical Esports Cup"),
    (102, "NASCAR Tour Modified Series"),
    (103, "NASCAR Class B Fixed Setup"),
    (112, "Production Car Sim-Lab Challenge"),
    (116, "Carburetor Cup"),
    (131, "Sprint Car Cup"),
    (133, "US Open Wheel B - Dallara IR-18"),
    (139, "Global Mazda MX-5 Fanatec Cup"),
    (164, "NASCAR Class C Maconi Setup Shop Fixed"),
    (165, "US Open Wheel C - Dallara IR18 Fixed Series"),
    (167, "ARCA Menards Series"),
    (182, "Street Stock Fanatec Series - R"),
    (190, "Street Stock Next Level Racing Series - C"),
    (191, "NASCAR Class A Fixed"),
    (201, "Grand Prix Legends"),
    (210, "Global Fanatec Challenge"),
    (223, "Super Late Model Series"),
    (228, "GT Sprint VRS Series"),
    (231, "Advanced Mazda MX-5 Cup Series"),
    (237, "GT Endurance VRS Series"),
    (259, "PickUp Cup"),
    (260, "Formula A - Grand Prix Series"),
    (285, "IMSA Vintage Series"),
    (291, "DIRTcar Limited Late Model Series"),
    (292, "DIRTcar 305 Sprint Car Fanatec Series"),
    (299, "iRacing Porsche Cup"),
    (305, "DIRTcar 360 Sprint Car Carquest Series"),
    (306, "DIRTcar Pro Late Model Series"),
    (307, "World of Outlaws Sprint Car Series"),
    (308, "World of Outlaws Late Model Series"),
    (309, "AMSOIL USAC Sprint Car - Fixed"),
    (310, "USAC 360 Sprint Car Series"),
    (311, "DIRTcar Class C Street Stock Series - Fixed"),
    (315, "Dirt Legends Cup"),
    (325, "Rallycross Series"),
    (327, "Dirt Midget Cup"),
    (353, "Ferrari GT3 Challenge - Fixed"),
    (359, "Formula B - Formula Renault 3.5 Series"),
    (369, "World of Outlaws Late Model Series - Fixed"),
    (391, "Pro 4 Off Road Racing Series"),
    (399, "Supercars Series"),
    (405, "Supercars Series - Australian Server Only"),
    (413, "NASCAR Legends Series"),
    (414, "US Open Wheel C - Indy Pro 2000 Series"),
    (416, "Super Late Model Series - Fixed"),
    (417, "NASCAR Tour Modified Series - Fixed"),
    (419, "IMSA Endurance Series"),
    (428, "SUPER DIRTcar Big Block Modified Series"),
    (429, "Dallara Formula iR - Fixed"),
    (430, "Touring Car Challenge - Fixed"),
    (431, "Formula C - DOF Reality Dallara F3 Series"),
    (432, "Proto-GT Thrustmaster Challenge"),
    (440, "CARS Late Model Stock Tour - Fixed"),
    (441, "SK Modified Weekly Series - Fixed"),
    (442, "DIRTcar UMP Modified Series - Fixed"),
    (443, "US Open Wheel D - USF 2000 Series - Fixed"),
    (444, "GT3 Fanatec Challenge - Fixed"),
    (446, "Rookie DIRTcar Street Stock Series - Fixed"),
    (447, "IMSA iRacing Series"),
    (455, "Formula Vee SIMAGIC Series"),
    (456, "Formula C - Thrustmaster Dallara F3 Series - Fixed"),
    (457, "LMP2 Prototype Challenge Fixed"),
    (458, "World of Outlaws Sprint Car Series - Fixed"),
    (459, "Rookie IRX Volkswagen Beetle Lite - Fixed"),
    (460, "iRX Volkswagen Beetle Lite"),
    (461, "Rallycross Series - Fixed"),
    (462, "Rookie Pro 2 Lite Off-Road Racing Series - Fixed"),
    (463, "Pro 4 Off-Road Racing Series - Fixed"),
    (464, "Pro 2 Off-Road Racing Series - Fixed"),
    (466, "DIRTcar 358 Modified Engine Ice Series"),
    (471, "Dallara Dash"),
    (476, "iRacing Porsche Cup - Fixed"),
    (481, "Winter iRacing Nascar Series - Fixed"),
    (482, "Winter iRacing Nascar Series"),
    (483, "Rookie Legends VRS Cup"),
    (484, "Formula A - Grand Prix Series - Fixed"),
    (490, "Pro 2 Off-Road Racing Series"),
    (491, "GT4 Falken Tyre Challenge-Fixed"),
    (492, "IMSA Michelin Pilot Challenge"),
    (493, "Stock Car Brasil - Fixed"),
    (497, "FIA Formula 4 Challenge"),
    (498, "FIA Formula 4 Challenge - Fixed"),
    (500, "Dirt Super Late Model Tour - Fixed"),
    (501, "Dirt 410 Sprint Car Tour"),
    (502, "Falken Tyre Sports Car Challenge"),
    (503, "Touring Car Challenge"),
    (505, "Mission R Challenge - Fixed"),
    (514, "GR Buttkicker Cup - Fixed"),
    (515, "Dirt Car 360 Sprint Fixed"),
    (516, "Dirt Midget Cup Fixed"),
    (517, "DIRTcar Pro Late Model Series - Fixed"),
    (518, "SUPER DIRTcar Big Block Modifieds Series - Fixed"),
    (519, "Clio Cup - Fixed"),
    (520, "Formula 1600 Rookie Sim-Motion Series - Fixed"),
    (521, "Formula 1600 Thrustmaster Trophy"),
    (524, "Gen 4 Cup - Fixed"),
    (525, "LMP3 Turn Racing Trophy - Fixed"),
    (526, "Ring Meister Ricmotech Series - Fixed"),
    (530, "Mustang Skip Barber Challenge - Fixed"),
    (535, "GTE Sprint Pure Driving School Series"),
    (536, "Formula B - Super Formula IMSIM Series"),
    (537, "Formula B - Super Formula IMSIM Series - Fixed"),
    (538, "Draft Master - Fixed"),
    (539, "IMSA iRacing Series - Fixed"),
    (540, "FIA F4 Esports Regional Tour - America"),
    (541, "FIA F4 Esports Regional Tour - East"),
    (542, "FIA F4 Esports Regional Tour - South"),
    (543, "FIA F4 Esports Regional Tour - North"),
    (548, "Weekly Race Challenge"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_lookup() {
        let tables = LookupTables::builtin();
        assert_eq!(tables.car_name(132), Some("BMW M4 GT3"));
        assert_eq!(tables.series_name(228), Some("GT Sprint VRS Series"));
        assert_eq!(tables.version(), BUILTIN_VERSION);
        assert_eq!(tables.car_count(), BUILTIN_CARS.len());
    }

    #[test]
    fn test_unknown_codes_resolve_to_sentinel() {
        let tables = LookupTables::builtin();
        assert_eq!(tables.car_name(9999), None);
        assert_eq!(tables.resolve_car(9999), UNKNOWN);
        assert_eq!(tables.resolve_series(0), UNKNOWN);
    }

    #[test]
    fn test_overrides_merge_over_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "version": "2024S2", "cars": {{ "188": "McLaren 720S GT3 EVO", "1": "Skip Barber" }} }}"#
        )
        .unwrap();

        let tables = LookupTables::load_overrides(file.path()).unwrap();
        assert_eq!(tables.version(), "2024S2");
        assert_eq!(tables.car_name(188), Some("McLaren 720S GT3 EVO"));
        assert_eq!(tables.car_name(1), Some("Skip Barber"));
        assert_eq!(tables.car_name(132), Some("BMW M4 GT3"));
        assert_eq!(tables.series_count(), BUILTIN_SERIES.len());
    }

    #[test]
    fn test_bad_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ \"cars\": [1, 2] }}").unwrap();
        assert!(matches!(
            LookupTables::load_overrides(file.path()),
            Err(LookupError::Parse(_))
        ));
    }
}
