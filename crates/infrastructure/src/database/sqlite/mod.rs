pub mod sqlite_help_request_repository;
pub mod sqlite_ranked_list_repository;
pub mod sqlite_volunteer_repository;

pub use sqlite_help_request_repository::SqliteHelpRequestRepository;
pub use sqlite_ranked_list_repository::SqliteRankedListRepository;
pub use sqlite_volunteer_repository::SqliteVolunteerRepository;
