//! 大圆距离计算

/// 地球半径（公里）
const EARTH_RADIUS_KM: f64 = 6371.0;

/// 计算两个坐标之间的大圆距离（haversine公式），单位公里
///
/// 纯函数，无错误路径。距离仅作为排序服务的参考属性，
/// 绝不用于从候选池中排除志愿者。
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}
