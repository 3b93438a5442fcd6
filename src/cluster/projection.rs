use geo::Coord;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Project lon/lat centroids onto a local equirectangular plane in metres,
/// centred on their mean position.
///
/// Over the extent of one district the distortion is well below the spacing
/// of neighbouring buildings, so Euclidean distances in this plane stand in
/// for great-circle distances.
pub fn local_plane(coords: &[Coord<f64>]) -> Vec<[f64; 2]> {
    if coords.is_empty() { return Vec::new() }
    let n = coords.len() as f64;
    let lon0 = coords.iter().map(|c| c.x).sum::<f64>() / n;
    let lat0 = coords.iter().map(|c| c.y).sum::<f64>() / n;
    let scale_x = EARTH_RADIUS_M * lat0.to_radians().cos();

    coords.iter()
        .map(|c| [
            (c.x - lon0).to_radians() * scale_x,
            (c.y - lat0).to_radians() * EARTH_RADIUS_M,
        ])
        .collect()
}
