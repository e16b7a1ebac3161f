//! Static routing from archive entries to sheet extractions
//!
//! Each rule matches an entry by filename suffix and lists the sheets to
//! extract from it. Rules are tried in order and the first match wins.

/// Which extractor writes a directive's output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Plain,
    /// Carries the managing weather office from section headers into rows
    Amedas,
}

/// One sheet range to write as one CSV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive {
    pub sheet: &'static str,
    /// Output base name, written as `<output>.csv`
    pub output: &'static str,
    pub start_row: u32,
    pub start_col: u32,
    pub columns: u32,
    pub extractor: Extractor,
}

#[derive(Debug)]
pub struct RoutingRule {
    pub suffix: &'static str,
    pub directives: &'static [Directive],
}

const fn plain(
    sheet: &'static str,
    output: &'static str,
    (start_row, start_col): (u32, u32),
    columns: u32,
) -> Directive {
    Directive {
        sheet,
        output,
        start_row,
        start_col,
        columns,
        extractor: Extractor::Plain,
    }
}

const fn amedas(
    sheet: &'static str,
    output: &'static str,
    (start_row, start_col): (u32, u32),
    columns: u32,
) -> Directive {
    Directive {
        extractor: Extractor::Amedas,
        ..plain(sheet, output, (start_row, start_col), columns)
    }
}

/// Entries without this extension are never opened
pub const WORKBOOK_EXTENSION: &str = ".xls";

pub const ROUTES: &[RoutingRule] = &[
    // Marine forecast areas
    RoutingRule {
        suffix: "AreaMarineAJ.xls",
        directives: &[
            plain("AreaMarineA", "AreaMarineA", (3, 0), 3),
            plain("AreaMarineJ", "AreaMarineJ", (4, 0), 5),
        ],
    },
    // National and regional forecast areas
    RoutingRule {
        suffix: "AreaForecast.xls",
        directives: &[plain("Sheet1", "AreaForecast", (2, 1), 4)],
    },
    // River offices
    RoutingRule {
        suffix: "RiverOffice.xls",
        directives: &[plain("RiverOffice", "RiverOffice", (3, 0), 2)],
    },
    // WMO station numbers
    RoutingRule {
        suffix: "WmoObservingStations.xls",
        directives: &[plain("WmoObservingStations.", "WmoObservingStations", (3, 0), 15)],
    },
    // Designated river flood forecast areas
    RoutingRule {
        suffix: "AreaFloodForecast.xls",
        directives: &[plain("AreaFloodForecast", "AreaFloodForecast", (3, 0), 3)],
    },
    // Designated river flood forecasts
    RoutingRule {
        suffix: "AreaRiver.xls",
        directives: &[plain("AreaRiver", "AreaRiver", (3, 0), 3)],
    },
    // Designated river water level stations
    RoutingRule {
        suffix: "WaterLevelStation.xls",
        directives: &[plain("WaterLevelStation", "WaterLevelStation", (3, 0), 3)],
    },
    // Municipalities and local forecast areas
    RoutingRule {
        suffix: "AreaInformationCity-AreaForecastLocalM.xls",
        directives: &[
            plain("AreaInformationCity", "AreaInformationCity", (3, 0), 19),
            plain("AreaForecastLocalM（コード表）", "AreaForecastLocalM", (4, 0), 13),
            plain(
                "AreaForecastLocalM（関係表\u{3000}警報・注意報",
                "AreaForecastLocalM_WarningTable",
                (3, 0),
                6,
            ),
            plain(
                "AreaForecastLocalM（関係表\u{3000}竜巻注意情報",
                "AreaForecastLocalM_TornadoTable",
                (3, 0),
                6,
            ),
        ],
    },
    // AMeDAS rain and snow observation points
    RoutingRule {
        suffix: "PointAmedas.xls",
        directives: &[
            amedas("ame_master", "AmedasRainPoint", (2, 0), 16),
            plain("snow_master", "AmedasSnowPoint", (2, 0), 12),
        ],
    },
    // Earthquake, tsunami and volcano codes
    RoutingRule {
        suffix: "地震火山関連コード表.xls",
        directives: &[
            plain("11", "EarthquakeWarning", (3, 0), 2),
            plain("12", "EarthquakeForecast", (3, 0), 3),
            plain("14", "TsunamiWarning", (3, 0), 3),
            plain("21", "AreaForecastEEW", (3, 0), 4),
            plain("22", "AreaForecastLocalEEW", (3, 0), 4),
            plain("23", "AreaInformationPrefectureEarthquake", (3, 0), 2),
            plain("24", "AreaForecastLocalE_AreaInformationCity_PointSeismicIntensity", (3, 0), 9),
            plain("25", "AreaForecastLocalE_AreaInformationCity_PointRealtimeIntensity", (3, 0), 6),
            plain("26", "AreaForecastLocalE_PointSeismicLgIntensity", (3, 0), 6),
            plain("31", "AreaTsunami", (3, 0), 4),
            plain("34", "CoastTsunami", (3, 0), 3),
            plain("35 ", "PointTsunami", (3, 0), 6),
            plain("41", "AreaEpicenter", (3, 0), 2),
            plain("42", "AreaEpicenterAbbreviation", (3, 0), 3),
            plain("43", "AreaEpicenterDetail", (3, 0), 2),
            plain("44", "AreaEpicenterSuppliment", (3, 0), 2),
            plain("51", "TokaiInformation", (3, 0), 2),
            plain("52", "EarthquakeInformation", (3, 0), 3),
            plain("62", "AdditionalCommentEarthquake", (3, 0), 2),
            plain("81", "VolcanicWarning", (3, 0), 3),
            plain("82 ", "PointVolcano", (3, 0), 4),
        ],
    },
];

/// First rule whose suffix matches `entry_name`
pub fn route_for<'a>(routes: &'a [RoutingRule], entry_name: &str) -> Option<&'a RoutingRule> {
    routes.iter().find(|rule| entry_name.ends_with(rule.suffix))
}
