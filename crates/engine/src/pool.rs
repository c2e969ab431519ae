//! 候选池构建器

use dispatch_domain::entities::{CandidateProfile, CandidateRecord, GeoPoint, VolunteerRecord};

use crate::geo::distance_km;

/// 任一端缺失坐标时使用的距离占位值（公里）
pub const UNKNOWN_DISTANCE_KM: f64 = 9999.0;

/// 由志愿者目录构建未排序的候选池
///
/// 没有可用坐标的志愿者直接跳过，不会出现在候选池中；
/// 请求者缺失坐标时，所有候选人的距离统一标注为占位值而不是报错。
/// 返回空池时调用方必须直接终结到 no_volunteers，不得调用排序服务。
pub fn build_candidate_pool(
    requester_location: Option<&GeoPoint>,
    volunteers: &[VolunteerRecord],
) -> Vec<CandidateRecord> {
    let mut pool = Vec::new();

    for volunteer in volunteers {
        let Some(volunteer_location) = volunteer.location else {
            continue;
        };

        let distance = match requester_location {
            Some(origin) => round_to_2dp(distance_km(
                origin.lat,
                origin.lng,
                volunteer_location.lat,
                volunteer_location.lng,
            )),
            None => UNKNOWN_DISTANCE_KM,
        };

        pool.push(CandidateRecord {
            volunteer_id: volunteer.id.clone(),
            distance_km: distance,
            profile: CandidateProfile {
                username: volunteer.username.clone(),
                skills: volunteer.skills.clone(),
                experience: volunteer.experience.clone(),
                languages: volunteer.languages.clone(),
                notes: volunteer.notes.clone(),
            },
        });
    }

    pool
}

fn round_to_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volunteer(id: &str, location: Option<GeoPoint>) -> VolunteerRecord {
        VolunteerRecord {
            id: id.to_string(),
            username: Some(format!("user-{id}")),
            location,
            skills: Some("first aid".to_string()),
            experience: None,
            languages: None,
            notes: None,
            is_volunteer: true,
            volunteer_status: "approved".to_string(),
        }
    }

    #[test]
    fn test_volunteers_without_location_are_excluded() {
        let volunteers = vec![
            volunteer("v1", Some(GeoPoint { lat: 31.0, lng: 121.0 })),
            volunteer("v2", None),
            volunteer("v3", Some(GeoPoint { lat: 32.0, lng: 120.0 })),
        ];
        let pool = build_candidate_pool(Some(&GeoPoint { lat: 31.5, lng: 120.5 }), &volunteers);

        let ids: Vec<&str> = pool.iter().map(|c| c.volunteer_id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v3"]);
    }

    #[test]
    fn test_missing_requester_location_uses_placeholder_distance() {
        let volunteers = vec![
            volunteer("v1", Some(GeoPoint { lat: 31.0, lng: 121.0 })),
            volunteer("v2", Some(GeoPoint { lat: 32.0, lng: 120.0 })),
        ];
        let pool = build_candidate_pool(None, &volunteers);

        assert_eq!(pool.len(), 2);
        for candidate in pool {
            assert_eq!(candidate.distance_km, UNKNOWN_DISTANCE_KM);
        }
    }

    #[test]
    fn test_distance_rounded_to_two_decimals() {
        let volunteers = vec![volunteer("v1", Some(GeoPoint { lat: 31.0, lng: 121.0 }))];
        let pool = build_candidate_pool(Some(&GeoPoint { lat: 31.5, lng: 120.5 }), &volunteers);

        let distance = pool[0].distance_km;
        assert_eq!(distance, round_to_2dp(distance));
        assert!(distance > 0.0);
    }

    #[test]
    fn test_empty_directory_yields_empty_pool() {
        let pool = build_candidate_pool(Some(&GeoPoint { lat: 0.0, lng: 0.0 }), &[]);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_profile_passed_through_verbatim() {
        let mut v = volunteer("v1", Some(GeoPoint { lat: 31.0, lng: 121.0 }));
        v.notes = Some("夜间可出动".to_string());
        let pool = build_candidate_pool(None, &[v]);

        assert_eq!(pool[0].profile.skills.as_deref(), Some("first aid"));
        assert_eq!(pool[0].profile.notes.as_deref(), Some("夜间可出动"));
    }
}
