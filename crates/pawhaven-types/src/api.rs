use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{
    AdoptionStatus, AlertLevel, ChatKind, LocationType, LostFoundStatus, NotificationKind,
    PetActivityLevel, PetGender, PetSize, PetSpecies, PetTemperament, PreferredActivityLevel,
    PreferredSize, PreferredSpecies, PreferredTemperament, RescueStatus,
};

// -- JWT Claims --

/// Bearer token payload. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Common --

/// Body of every error response and of plain acknowledgements.
#[derive(Debug, Serialize, Deserialize)]
pub struct Detail {
    pub detail: String,
}

/// `?lat=&lon=&radius_km=` for proximity searches.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
}

fn default_radius_km() -> f64 {
    10.0
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    #[serde(default)]
    pub preferred_species: Option<PreferredSpecies>,
    #[serde(default)]
    pub preferred_size: Option<PreferredSize>,
    #[serde(default)]
    pub temperament: Option<PreferredTemperament>,
    #[serde(default)]
    pub activity_level: Option<PreferredActivityLevel>,
    #[serde(default)]
    pub min_age: Option<i64>,
    #[serde(default)]
    pub max_age: Option<i64>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
}

/// OAuth2 password-grant form. Extra OAuth2 fields (grant_type, scope, ...)
/// are accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResendCodeRequest {
    pub email: String,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_photo_url: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub preferred_species: Option<PreferredSpecies>,
    pub preferred_size: Option<PreferredSize>,
    pub temperament: Option<PreferredTemperament>,
    pub activity_level: Option<PreferredActivityLevel>,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreferenceUpdate {
    pub preferred_species: Option<PreferredSpecies>,
    pub preferred_size: Option<PreferredSize>,
    pub temperament: Option<PreferredTemperament>,
    pub activity_level: Option<PreferredActivityLevel>,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
}

// -- Pets --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PetCreate {
    pub name: String,
    #[serde(default = "default_species")]
    pub species: PetSpecies,
    #[serde(default)]
    pub breed: Option<String>,
    /// Age in months.
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default = "default_gender")]
    pub gender: PetGender,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub size: Option<PetSize>,
    #[serde(default)]
    pub temperament: Option<PetTemperament>,
    #[serde(default)]
    pub activity_level: Option<PetActivityLevel>,
}

fn default_species() -> PetSpecies {
    PetSpecies::Dog
}

fn default_gender() -> PetGender {
    PetGender::Unknown
}

/// Partial update; omitted fields stay unchanged. `images: []` clears the list.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PetUpdate {
    pub name: Option<String>,
    pub species: Option<PetSpecies>,
    pub breed: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<PetGender>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub size: Option<PetSize>,
    pub temperament: Option<PetTemperament>,
    pub activity_level: Option<PetActivityLevel>,
    pub is_adopted: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetResponse {
    pub pet_id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub species: PetSpecies,
    pub breed: Option<String>,
    pub age: Option<i64>,
    pub gender: PetGender,
    pub color: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub size: Option<PetSize>,
    pub temperament: Option<PetTemperament>,
    pub activity_level: Option<PetActivityLevel>,
    pub is_adopted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Adoption requests --

#[derive(Debug, Deserialize)]
pub struct AdoptionRequestCreate {
    #[serde(default)]
    pub description: Option<String>,
    pub pet: PetCreate,
}

/// `status` stays a string so an unknown value is a 400 rather than a
/// body rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdoptionRequestUpdate {
    pub description: Option<String>,
    pub status: Option<String>,
    pub chat_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdoptionRequestResponse {
    pub id: Uuid,
    pub pet: PetResponse,
    pub requester_id: Uuid,
    pub description: Option<String>,
    pub status: AdoptionStatus,
    pub chat_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Rescue reports --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RescueReportCreate {
    pub location: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default = "default_rescue_status")]
    pub status: RescueStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_alert")]
    pub alert_type: AlertLevel,
}

fn default_rescue_status() -> RescueStatus {
    RescueStatus::Pending
}

fn default_alert() -> AlertLevel {
    AlertLevel::Medium
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RescueReportUpdate {
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo: Option<String>,
    pub status: Option<RescueStatus>,
    pub description: Option<String>,
    pub alert_type: Option<AlertLevel>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RescueReportResponse {
    #[serde(rename = "reportId")]
    pub report_id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "userFirstName")]
    pub user_first_name: Option<String>,
    #[serde(rename = "userLastName")]
    pub user_last_name: Option<String>,
    #[serde(rename = "userFullName")]
    pub user_full_name: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo: Option<String>,
    pub status: RescueStatus,
    pub alert_type: AlertLevel,
    pub description: Option<String>,
    #[serde(rename = "chatId")]
    pub chat_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Lost & found --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LostFoundCreate {
    #[serde(default)]
    pub pet_name: Option<String>,
    #[serde(default)]
    pub pet_type: Option<String>,
    #[serde(default = "default_gender")]
    pub gender: PetGender,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default = "default_lost_status")]
    pub status: LostFoundStatus,
}

fn default_lost_status() -> LostFoundStatus {
    LostFoundStatus::Lost
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LostFoundUpdate {
    pub pet_name: Option<String>,
    pub pet_type: Option<String>,
    pub gender: Option<PetGender>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo: Option<String>,
    pub status: Option<LostFoundStatus>,
    pub chat_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LostFoundResponse {
    #[serde(rename = "reportId")]
    pub report_id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "userFirstName")]
    pub user_first_name: Option<String>,
    #[serde(rename = "userLastName")]
    pub user_last_name: Option<String>,
    #[serde(rename = "userFullName")]
    pub user_full_name: Option<String>,
    pub pet_name: Option<String>,
    pub pet_type: Option<String>,
    pub gender: PetGender,
    pub description: Option<String>,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo: Option<String>,
    pub status: LostFoundStatus,
    #[serde(rename = "chatId")]
    pub chat_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Stray map --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrayMapCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact_info: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: LocationType,
}

#[derive(Debug, Deserialize)]
pub struct StrayMapQuery {
    pub location_type: Option<LocationType>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StrayMapResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: LocationType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Chats --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatCreate {
    pub chat_type: ChatKind,
    #[serde(default)]
    pub related_entity_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(rename = "chatId")]
    pub chat_id: Uuid,
    pub chat_type: ChatKind,
    pub related_entity_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub members: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinChatResponse {
    pub detail: String,
    #[serde(rename = "chatId")]
    pub chat_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatMessageCreate {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageQuery {
    #[serde(default = "default_message_limit")]
    pub limit: u32,
}

fn default_message_limit() -> u32 {
    100
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    #[serde(rename = "messageId")]
    pub message_id: Uuid,
    #[serde(rename = "chatId")]
    pub chat_id: Uuid,
    #[serde(rename = "senderId")]
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// -- Leaderboard --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaderboardCreate {
    pub user_id: Uuid,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub rescues: i64,
    #[serde(default)]
    pub adoptions: i64,
    #[serde(default)]
    pub lost_pets: i64,
    #[serde(default)]
    pub map_contributions: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub score: i64,
    pub last_active: String,
    pub rescues: i64,
    pub adoptions: i64,
    pub lost_pets: i64,
    pub map_contributions: i64,
    pub avatar: Option<String>,
    pub rank: usize,
}

// -- Notifications --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationCreate {
    pub message: String,
}

/// Form body of `POST /notifications/nearby`.
#[derive(Debug, Deserialize)]
pub struct NearbyNotificationForm {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub notif_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub viewed: bool,
    pub notif_type: Option<NotificationKind>,
    pub chat_id: Option<Uuid>,
    pub report_id: Option<Uuid>,
}

// -- Products --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub affiliated_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub image_url: Option<String>,
    pub affiliated_url: Option<String>,
    pub is_active: bool,
}

// -- Cart --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartItem {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub buyer_phone: Option<String>,
    pub items: Vec<CartItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: Uuid,
    pub whatsapp_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecentOrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecentOrder {
    pub id: Uuid,
    pub buyer_name: Option<String>,
    pub date: DateTime<Utc>,
    pub total: f64,
    pub items: Vec<RecentOrderItem>,
}

// -- Recommendations --

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendedPet {
    pub pet_id: Uuid,
    pub name: String,
    pub species: PetSpecies,
    pub breed: Option<String>,
    pub age: Option<i64>,
    pub gender: PetGender,
    pub color: Option<String>,
    pub size: Option<PetSize>,
    pub temperament: Option<PetTemperament>,
    pub activity_level: Option<PetActivityLevel>,
    pub description: Option<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub user_id: Uuid,
    pub recommendations: Vec<RecommendedPet>,
}

// -- Stats --

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub rescues: i64,
    pub adoptions: i64,
    pub located: i64,
}
