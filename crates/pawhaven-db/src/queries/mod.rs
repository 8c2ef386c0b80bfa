pub mod adoption;
pub mod chats;
pub mod leaderboard;
pub mod lost_found;
pub mod notifications;
pub mod pets;
pub mod rescue;
pub mod stats;
pub mod store;
pub mod stray_map;
pub mod users;
