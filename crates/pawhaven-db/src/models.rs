//! Database row types. These map directly to SQLite rows; ids, enum values
//! and timestamps stay as the text stored in the table. Conversion into API
//! models happens in pawhaven-api.

// -- Users --

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub profile_photo_url: Option<String>,
    pub preferred_species: Option<String>,
    pub preferred_size: Option<String>,
    pub temperament: Option<String>,
    pub activity_level: Option<String>,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    pub is_admin: bool,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub email_verification_token: Option<String>,
    pub email_verification_expires_at: Option<String>,
    pub email_verification_attempts: i64,
    pub created_at: String,
}

pub struct NewUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub profile_photo_url: Option<String>,
    pub preferences: UserPreferences,
    pub is_admin: bool,
}

/// The full set of preference columns, written as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPreferences {
    pub preferred_species: Option<String>,
    pub preferred_size: Option<String>,
    pub temperament: Option<String>,
    pub activity_level: Option<String>,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
}

// -- Pets --

#[derive(Debug, Clone)]
pub struct PetRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<i64>,
    pub gender: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub temperament: Option<String>,
    pub activity_level: Option<String>,
    pub description: Option<String>,
    pub is_adopted: bool,
    pub images: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NewPet {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<i64>,
    pub gender: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub temperament: Option<String>,
    pub activity_level: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
}

// -- Chats --

#[derive(Debug, Clone)]
pub struct ChatRow {
    pub id: String,
    pub kind: String,
    pub related_entity_id: Option<String>,
    pub creator_id: String,
    pub created_at: String,
}

/// A chat together with its first member (the creator).
pub struct NewChat {
    pub id: String,
    pub kind: String,
    pub related_entity_id: Option<String>,
    pub creator_id: String,
}

pub struct ChatMessageRow {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: String,
}

// -- Adoption requests --

#[derive(Debug, Clone)]
pub struct AdoptionRequestRow {
    pub id: String,
    pub pet_id: String,
    pub requester_id: String,
    pub chat_id: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NewAdoptionRequest {
    pub id: String,
    pub requester_id: String,
    pub description: Option<String>,
}

// -- Rescue reports --

#[derive(Debug, Clone)]
pub struct RescueReportRow {
    pub id: String,
    pub user_id: String,
    pub description: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo: Option<String>,
    pub status: String,
    pub alert_type: String,
    pub chat_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Reporter names, joined from users.
    pub reporter_first_name: Option<String>,
    pub reporter_last_name: Option<String>,
}

pub struct NewRescueReport {
    pub id: String,
    pub user_id: String,
    pub description: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo: Option<String>,
    pub status: String,
    pub alert_type: String,
}

// -- Lost & found --

#[derive(Debug, Clone)]
pub struct LostFoundRow {
    pub id: String,
    pub user_id: String,
    pub pet_name: Option<String>,
    pub pet_type: Option<String>,
    pub gender: String,
    pub description: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo: Option<String>,
    pub status: String,
    pub chat_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub reporter_first_name: Option<String>,
    pub reporter_last_name: Option<String>,
}

pub struct NewLostFoundReport {
    pub id: String,
    pub user_id: String,
    pub pet_name: Option<String>,
    pub pet_type: Option<String>,
    pub gender: String,
    pub description: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo: Option<String>,
    pub status: String,
}

// -- Notifications --

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub kind: Option<String>,
    pub chat_id: Option<String>,
    pub report_id: Option<String>,
    pub viewed: bool,
    pub created_at: String,
}

pub struct NewNotification {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub kind: Option<String>,
    pub chat_id: Option<String>,
    pub report_id: Option<String>,
}

// -- Leaderboard --

pub struct LeaderboardRow {
    pub id: String,
    pub user_id: String,
    pub score: i64,
    pub last_active: String,
    pub rescues: i64,
    pub adoptions: i64,
    pub lost_pets: i64,
    pub map_contributions: i64,
    pub created_at: String,
    /// Joined from users.
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
}

pub struct NewLeaderboardEntry {
    pub id: String,
    pub user_id: String,
    pub score: i64,
    pub rescues: i64,
    pub adoptions: i64,
    pub lost_pets: i64,
    pub map_contributions: i64,
}

// -- Stray map --

pub struct StrayMapRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct NewStrayMapEntry {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: String,
}

// -- Store --

pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub image_url: Option<String>,
    pub affiliated_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub image_url: Option<String>,
    pub affiliated_url: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub buyer_name: Option<String>,
    pub buyer_phone: Option<String>,
    pub total_cents: i64,
    pub sent_to_whatsapp: bool,
    pub created_at: String,
    pub items: Vec<OrderItemRow>,
}

#[derive(Debug, Clone)]
pub struct OrderItemRow {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

pub struct NewOrder {
    pub id: String,
    pub buyer_name: Option<String>,
    pub buyer_phone: Option<String>,
    pub sent_to_whatsapp: bool,
}

// -- Stats --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformStats {
    pub resolved_rescues: i64,
    pub completed_adoptions: i64,
    pub located_strays: i64,
}
