use crate::models::GeoPoint;

/// Render the `is_in` query for the relations at `admin_level` enclosing `point`.
pub fn build_query(point: GeoPoint, admin_level: &str) -> String {
    format!(
        r#"
[out:json];
is_in({:.6},{:.6})->.a;
relation(pivot.a)[admin_level={}];
out tags bb;
"#,
        point.lat, point.lon, admin_level
    )
}
