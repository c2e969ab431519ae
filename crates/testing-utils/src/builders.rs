//! Test data builders for creating test entities

use chrono::Utc;

use dispatch_domain::entities::{
    GeoPoint, HelpRequest, RankedCandidate, RankedList, RequestStatus, VolunteerRecord,
};

/// Builder for creating test HelpRequest entities
pub struct HelpRequestBuilder {
    request: HelpRequest,
}

impl HelpRequestBuilder {
    pub fn new() -> Self {
        Self {
            request: HelpRequest::new("req-1", "owner-1"),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.request.id = id.to_string();
        self
    }

    pub fn with_owner(mut self, owner_id: &str) -> Self {
        self.request.owner_id = owner_id.to_string();
        self
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.request.location = Some(GeoPoint { lat, lng });
        self
    }

    pub fn with_resume(mut self, resume: serde_json::Value) -> Self {
        self.request.resume = resume;
        self
    }

    pub fn with_status(mut self, status: RequestStatus) -> Self {
        self.request.status = status;
        self
    }

    /// Puts the request mid-escalation: awaiting the given volunteer at the
    /// given position in the ranked list.
    pub fn awaiting(mut self, volunteer_id: &str, index: i64) -> Self {
        self.request.status = RequestStatus::AwaitingVolunteer;
        self.request.current_volunteer_id = Some(volunteer_id.to_string());
        self.request.current_volunteer_index = index;
        self
    }

    pub fn build(self) -> HelpRequest {
        self.request
    }
}

impl Default for HelpRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test VolunteerRecord entities
pub struct VolunteerBuilder {
    volunteer: VolunteerRecord,
}

impl VolunteerBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            volunteer: VolunteerRecord {
                id: id.to_string(),
                username: Some(format!("user-{id}")),
                location: Some(GeoPoint {
                    lat: 31.23,
                    lng: 121.47,
                }),
                skills: Some("first aid".to_string()),
                experience: None,
                languages: None,
                notes: None,
                is_volunteer: true,
                volunteer_status: "approved".to_string(),
            },
        }
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.volunteer.location = Some(GeoPoint { lat, lng });
        self
    }

    pub fn without_location(mut self) -> Self {
        self.volunteer.location = None;
        self
    }

    pub fn with_skills(mut self, skills: &str) -> Self {
        self.volunteer.skills = Some(skills.to_string());
        self
    }

    pub fn unapproved(mut self) -> Self {
        self.volunteer.volunteer_status = "pending".to_string();
        self
    }

    pub fn not_volunteer(mut self) -> Self {
        self.volunteer.is_volunteer = false;
        self
    }

    pub fn build(self) -> VolunteerRecord {
        self.volunteer
    }
}

/// Creates a ranked list over the given volunteer ids, best first.
pub fn ranked_list(request_id: &str, volunteer_ids: &[&str]) -> RankedList {
    RankedList {
        request_id: request_id.to_string(),
        ranked: volunteer_ids
            .iter()
            .enumerate()
            .map(|(index, id)| RankedCandidate {
                volunteer_id: id.to_string(),
                score: 1.0 - index as f64 * 0.1,
                distance_km: 1.0 + index as f64,
                reason: format!("test rank {index}"),
            })
            .collect(),
        created_at: Utc::now(),
    }
}
