//! Projection UTM (Universal Transverse Mercator)
//!
//! Séries de Krüger à l'ordre 6 (forme de Karney), précision sub-millimétrique
//! dans la zone et encore correcte plusieurs degrés au-delà : les TPA de
//! Hafar Al-Batin sont saisies en zone 39N alors qu'elles sont à ~5° à l'ouest
//! du méridien central.

use crate::crs::Geographic;
use crate::ellipsoid::WGS84;

/// Facteur d'échelle au méridien central
const K0: f64 = 0.9996;

/// False easting
const X0: f64 = 500000.0;

/// False northing (hémisphère sud)
const Y0_SOUTH: f64 = 10000000.0;

/// Zone UTM sur l'ellipsoïde WGS84
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    /// Numéro de zone (1..=60)
    pub zone: u8,
    /// Hémisphère sud
    pub south: bool,
}

impl UtmZone {
    pub fn new(zone: u8, south: bool) -> Option<Self> {
        (1..=60).contains(&zone).then_some(Self { zone, south })
    }

    /// Longitude du méridien central (radians)
    pub fn central_meridian(self) -> f64 {
        ((self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
    }

    fn false_northing(self) -> f64 {
        if self.south {
            Y0_SOUTH
        } else {
            0.0
        }
    }
}

/// Coefficients des séries, dépendants uniquement de l'ellipsoïde
struct Series {
    /// Rayon rectifiant
    a: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
    delta: [f64; 6],
}

impl Series {
    fn wgs84() -> Self {
        let n = WGS84::N;
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let a = WGS84::A / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);

        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0 - 127.0 * n5 / 288.0
                + 7891.0 * n6 / 37800.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0
                - 1983433.0 * n6 / 1935360.0,
            61.0 * n3 / 240.0 - 103.0 * n4 / 140.0 + 15061.0 * n5 / 26880.0
                + 167603.0 * n6 / 181440.0,
            49561.0 * n4 / 161280.0 - 179.0 * n5 / 168.0 + 6601661.0 * n6 / 7257600.0,
            34729.0 * n5 / 80640.0 - 3418889.0 * n6 / 1995840.0,
            212378941.0 * n6 / 319334400.0,
        ];

        let beta = [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0 - 81.0 * n5 / 512.0
                + 96199.0 * n6 / 604800.0,
            n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0 + 46.0 * n5 / 105.0
                - 1118711.0 * n6 / 3870720.0,
            17.0 * n3 / 480.0 - 37.0 * n4 / 840.0 - 209.0 * n5 / 4480.0 + 5569.0 * n6 / 90720.0,
            4397.0 * n4 / 161280.0 - 11.0 * n5 / 504.0 - 830251.0 * n6 / 7257600.0,
            4583.0 * n5 / 161280.0 - 108847.0 * n6 / 3991680.0,
            20648693.0 * n6 / 638668800.0,
        ];

        // Latitude conforme -> latitude géographique
        let delta = [
            2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3 + 116.0 * n4 / 45.0 + 26.0 * n5 / 45.0
                - 2854.0 * n6 / 675.0,
            7.0 * n2 / 3.0 - 8.0 * n3 / 5.0 - 227.0 * n4 / 45.0 + 2704.0 * n5 / 315.0
                + 2323.0 * n6 / 945.0,
            56.0 * n3 / 15.0 - 136.0 * n4 / 35.0 - 1262.0 * n5 / 105.0 + 73814.0 * n6 / 2835.0,
            4279.0 * n4 / 630.0 - 332.0 * n5 / 35.0 - 399572.0 * n6 / 14175.0,
            4174.0 * n5 / 315.0 - 144838.0 * n6 / 6237.0,
            601676.0 * n6 / 22275.0,
        ];

        Self {
            a,
            alpha,
            beta,
            delta,
        }
    }
}

/// Convertit UTM vers coordonnées géographiques WGS84
pub fn utm_to_geographic(x: f64, y: f64, zone: UtmZone) -> Geographic {
    let s = Series::wgs84();

    let xi = (y - zone.false_northing()) / (K0 * s.a);
    let eta = (x - X0) / (K0 * s.a);

    let mut xi_p = xi;
    let mut eta_p = eta;
    for (j, beta) in s.beta.iter().enumerate() {
        let k = 2.0 * (j as f64 + 1.0);
        xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
        eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
    }

    // Latitude conforme
    let chi = (xi_p.sin() / eta_p.cosh()).asin();

    let lat = chi
        + s.delta
            .iter()
            .enumerate()
            .map(|(j, d)| d * (2.0 * (j as f64 + 1.0) * chi).sin())
            .sum::<f64>();

    let lon = zone.central_meridian() + eta_p.sinh().atan2(xi_p.cos());

    Geographic::new(lon, lat)
}

/// Convertit coordonnées géographiques WGS84 vers UTM
pub fn geographic_to_utm(geo: Geographic, zone: UtmZone) -> (f64, f64) {
    let s = Series::wgs84();
    let e = WGS84::E;

    let dlon = geo.lon - zone.central_meridian();
    let sin_lat = geo.lat.sin();

    let t = (sin_lat.atanh() - e * (e * sin_lat).atanh()).sinh();
    let xi_p = t.atan2(dlon.cos());
    let eta_p = (dlon.sin() / (1.0 + t * t).sqrt()).atanh();

    let mut xi = xi_p;
    let mut eta = eta_p;
    for (j, alpha) in s.alpha.iter().enumerate() {
        let k = 2.0 * (j as f64 + 1.0);
        xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
        eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
    }

    let x = X0 + K0 * s.a * eta;
    let y = zone.false_northing() + K0 * s.a * xi;

    (x, y)
}
