use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use pawhaven_db::models::{NewPet, PetRow};
use pawhaven_types::api::{Claims, PetCreate, PetResponse, PetUpdate};
use pawhaven_types::enums::{PetGender, PetSpecies};

use crate::convert;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path};
use crate::run_blocking;
use crate::state::AppState;

pub(crate) fn pet_response(row: PetRow) -> PetResponse {
    PetResponse {
        pet_id: convert::uuid(&row.id, "pet id"),
        owner_id: convert::uuid(&row.owner_id, "pet owner id"),
        name: row.name,
        species: convert::enum_or(&row.species, PetSpecies::Other, "species"),
        breed: row.breed,
        age: row.age,
        gender: convert::enum_or(&row.gender, PetGender::Unknown, "gender"),
        color: row.color,
        description: row.description,
        images: row.images,
        size: convert::opt_enum(row.size.as_deref(), "size"),
        temperament: convert::opt_enum(row.temperament.as_deref(), "temperament"),
        activity_level: convert::opt_enum(row.activity_level.as_deref(), "activity_level"),
        is_adopted: row.is_adopted,
        created_at: convert::timestamp(&row.created_at, "pet created_at"),
        updated_at: convert::timestamp(&row.updated_at, "pet updated_at"),
    }
}

/// Validate a create body and turn it into an insert row owned by `owner`.
pub(crate) fn new_pet(owner: Uuid, req: PetCreate) -> ApiResult<NewPet> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Pet name is required"));
    }
    if req.age.is_some_and(|a| a < 0) {
        return Err(ApiError::bad_request("Pet age cannot be negative"));
    }

    Ok(NewPet {
        id: Uuid::new_v4().to_string(),
        owner_id: owner.to_string(),
        name: name.to_string(),
        species: req.species.as_str().to_string(),
        breed: req.breed,
        age: req.age,
        gender: req.gender.as_str().to_string(),
        color: req.color,
        size: req.size.map(|v| v.as_str().to_string()),
        temperament: req.temperament.map(|v| v.as_str().to_string()),
        activity_level: req.activity_level.map(|v| v.as_str().to_string()),
        description: req.description,
        images: req.images,
    })
}

/// Load a pet the caller owns. Someone else's pet is reported as missing.
async fn owned_pet(state: &AppState, claims: &Claims, pet_id: Uuid) -> ApiResult<PetRow> {
    let id = pet_id.to_string();
    let pet = run_blocking(state, move |db| db.get_pet(&id))
        .await?
        .ok_or_else(|| ApiError::not_found("Pet not found"))?;
    if pet.owner_id != claims.sub.to_string() {
        return Err(ApiError::not_found("Pet not found"));
    }
    Ok(pet)
}

pub async fn create_pet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PetCreate>,
) -> ApiResult<impl IntoResponse> {
    let pet = new_pet(claims.sub, req)?;
    let id = pet.id.clone();
    let row = run_blocking(&state, move |db| {
        db.create_pet(&pet)?;
        db.get_pet(&pet.id)
    })
    .await?
    .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("pet {} vanished after insert", id)))?;

    info!("Pet {} created by {}", row.id, claims.sub);
    Ok((StatusCode::CREATED, Json(pet_response(row))))
}

pub async fn list_pets(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<PetResponse>>> {
    let owner = claims.sub.to_string();
    let rows = run_blocking(&state, move |db| db.list_pets_by_owner(&owner)).await?;
    Ok(Json(rows.into_iter().map(pet_response).collect()))
}

pub async fn get_pet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(pet_id): Path<Uuid>,
) -> ApiResult<Json<PetResponse>> {
    let pet = owned_pet(&state, &claims, pet_id).await?;
    Ok(Json(pet_response(pet)))
}

pub async fn update_pet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(pet_id): Path<Uuid>,
    Json(req): Json<PetUpdate>,
) -> ApiResult<Json<PetResponse>> {
    let mut pet = owned_pet(&state, &claims, pet_id).await?;

    if let Some(name) = req.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::bad_request("Pet name is required"));
        }
        pet.name = name.to_string();
    }
    if let Some(age) = req.age {
        if age < 0 {
            return Err(ApiError::bad_request("Pet age cannot be negative"));
        }
        pet.age = Some(age);
    }
    if let Some(species) = req.species {
        pet.species = species.as_str().to_string();
    }
    if let Some(gender) = req.gender {
        pet.gender = gender.as_str().to_string();
    }
    if let Some(size) = req.size {
        pet.size = Some(size.as_str().to_string());
    }
    if let Some(temperament) = req.temperament {
        pet.temperament = Some(temperament.as_str().to_string());
    }
    if let Some(activity) = req.activity_level {
        pet.activity_level = Some(activity.as_str().to_string());
    }
    if let Some(images) = req.images {
        pet.images = images;
    }
    if let Some(adopted) = req.is_adopted {
        pet.is_adopted = adopted;
    }
    pet.breed = req.breed.or(pet.breed);
    pet.color = req.color.or(pet.color);
    pet.description = req.description.or(pet.description);

    let id = pet.id.clone();
    let row = run_blocking(&state, move |db| {
        db.update_pet(&pet)?;
        db.get_pet(&id)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Pet not found"))?;
    Ok(Json(pet_response(row)))
}

pub async fn adopt_pet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(pet_id): Path<Uuid>,
) -> ApiResult<Json<PetResponse>> {
    let pet = owned_pet(&state, &claims, pet_id).await?;
    let id = pet.id;
    let (changed, row) = run_blocking(&state, move |db| {
        let changed = db.mark_pet_adopted(&id)?;
        Ok((changed, db.get_pet(&id)?))
    })
    .await?;
    let row = row.ok_or_else(|| ApiError::not_found("Pet not found"))?;

    if changed {
        info!("Pet {} marked adopted by {}", row.id, claims.sub);
    }
    Ok(Json(pet_response(row)))
}

pub async fn delete_pet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(pet_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let pet = owned_pet(&state, &claims, pet_id).await?;
    let id = pet.id;
    run_blocking(&state, move |db| db.delete_pet(&id)).await?;
    info!("Pet {} deleted by {}", pet_id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}
