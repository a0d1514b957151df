//! GPX file generation from course points.
//!
//! Writes GPX 1.1 XML that the predictor's course loader reads back.

use predictor::course::CoursePoint;

/// Generates a GPX 1.1 XML document with a single track segment.
///
/// Points without elevation are written without an `<ele>` element.
pub fn generate_gpx(points: &[CoursePoint], course_name: &str) -> Vec<u8> {
    let name = escape_xml(course_name);
    let mut gpx = String::new();

    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(r#"<gpx version="1.1" creator="marathon-predictor-test-data""#);
    gpx.push_str(r#" xmlns="http://www.topografix.com/GPX/1/1">"#);
    gpx.push('\n');

    gpx.push_str(&format!("  <metadata>\n    <name>{name}</name>\n  </metadata>\n"));
    gpx.push_str(&format!("  <trk>\n    <name>{name}</name>\n    <trkseg>\n"));

    for point in points {
        gpx.push_str(&format!(
            r#"      <trkpt lat="{:.7}" lon="{:.7}">"#,
            point.lat, point.lon
        ));
        if let Some(ele) = point.elevation {
            gpx.push_str(&format!("<ele>{ele:.2}</ele>"));
        }
        gpx.push_str("</trkpt>\n");
    }

    gpx.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    gpx.into_bytes()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
