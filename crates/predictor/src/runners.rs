//! 2026 London Marathon elite men's field.

use crate::{errors::AppError, timefmt::parse_hms};

/// (name, recent marathon PB as `H:MM:SS`)
pub const ELITE_MEN_2026: &[(&str, &str)] = &[
    ("Sebastian Sawe", "2:02:05"),
    ("Jacob Kiplimo", "2:02:23"),
    ("Deresa Geleta", "2:02:38"),
    ("Amos Kipruto", "2:03:13"),
    ("Tamirat Tola", "2:03:39"),
    ("Amanal Petros", "2:04:03"),
    ("Geoffrey Kamworor", "2:04:23"),
    ("Joshua Cheptegei", "2:04:52"),
    ("Shunya Kikuchi", "2:06:06"),
    ("Emile Cairess", "2:06:46"),
    ("Mahamed Mahamed", "2:07:05"),
    ("Philip Sesemann", "2:07:10"),
    ("Hassan Chahdi", "2:07:30"),
    ("Adam Lipschitz", "2:08:54"),
    ("Patrick Dever", "2:08:58"),
    ("Peter Lynch", "2:09:36"),
    ("Tim Vincent", "2:09:40"),
    ("Dewi Griffiths", "2:09:49"),
    ("Weynay Ghebresilasie", "2:09:50"),
    ("Tewelde Menges", "2:09:58"),
    ("George James", "2:10:10"),
    ("Liam Boudin", "2:10:28"),
    ("Jake Smith", "2:11:00"),
    ("Marc Scott", "2:11:19"),
    ("Jack Rowe", "2:12:31"),
    ("Andrew Fyfe", "2:13:20"),
    ("Alex Milne", "2:14:03"),
    ("Peter Le Grice", "2:14:45"),
    ("Sean Hogan", "2:14:51"),
    ("Jack Barraclough", "2:14:55"),
    ("Christopher Thomas", "2:14:55"),
    ("Chris Perry", "2:14:57"),
    ("David Bishop", "2:15:16"),
    ("Charlie Sandison", "2:15:38"),
    ("William Mycroft", "2:15:54"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Runner {
    pub name: String,
    pub pb_time: String,
    pub pb_seconds: f64,
}

impl Runner {
    pub fn new(name: &str, pb_time: &str) -> Result<Self, AppError> {
        Ok(Self {
            name: name.to_string(),
            pb_time: pb_time.to_string(),
            pb_seconds: parse_hms(pb_time)?,
        })
    }
}

/// The elite field with parsed PBs.
pub fn elite_field() -> Result<Vec<Runner>, AppError> {
    ELITE_MEN_2026
        .iter()
        .map(|(name, pb)| Runner::new(name, pb))
        .collect()
}
