use axum::{Extension, extract::State};
use tracing::debug;

use pawhaven_db::models::{PetRow, UserRow};
use pawhaven_recommender::{Candidate, Preference};
use pawhaven_types::api::{Claims, RecommendQuery, RecommendationResponse, RecommendedPet};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Query};
use crate::pets::pet_response;
use crate::run_blocking;
use crate::state::AppState;
use crate::users::current_user;

pub const MAX_TOP_K: usize = 50;

fn preference(user: &UserRow) -> Preference {
    Preference {
        species: user.preferred_species.clone(),
        size: user.preferred_size.clone(),
        temperament: user.temperament.clone(),
        activity_level: user.activity_level.clone(),
        min_age: user.min_age,
        max_age: user.max_age,
    }
}

fn candidate(pet: &PetRow) -> Candidate {
    Candidate {
        species: pet.species.clone(),
        size: pet.size.clone(),
        temperament: pet.temperament.clone(),
        activity_level: pet.activity_level.clone(),
        age: pet.age,
    }
}

fn recommended(pet: PetRow) -> RecommendedPet {
    let pet = pet_response(pet);
    RecommendedPet {
        pet_id: pet.pet_id,
        name: pet.name,
        species: pet.species,
        breed: pet.breed,
        age: pet.age,
        gender: pet.gender,
        color: pet.color,
        size: pet.size,
        temperament: pet.temperament,
        activity_level: pet.activity_level,
        description: pet.description,
        images: pet.images,
    }
}

/// Nearest adoptable pets to the caller's stored preferences.
pub async fn recommend(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(q): Query<RecommendQuery>,
) -> ApiResult<Json<RecommendationResponse>> {
    if !(1..=MAX_TOP_K).contains(&q.top_k) {
        return Err(ApiError::bad_request(format!(
            "top_k must be between 1 and {MAX_TOP_K}"
        )));
    }

    let me = current_user(&state, &claims).await?;
    let owner = me.id.clone();
    let pets = run_blocking(&state, move |db| db.list_adoptable_pets(&owner)).await?;

    let candidates: Vec<Candidate> = pets.iter().map(candidate).collect();
    let picked = state
        .recommender
        .recommend(&preference(&me), &candidates, q.top_k);
    debug!(
        "Recommended {} of {} candidates to {}",
        picked.len(),
        candidates.len(),
        claims.sub
    );

    let mut pets: Vec<Option<PetRow>> = pets.into_iter().map(Some).collect();
    let recommendations = picked
        .into_iter()
        .filter_map(|i| pets.get_mut(i).and_then(Option::take))
        .map(recommended)
        .collect();

    Ok(Json(RecommendationResponse {
        user_id: claims.sub,
        recommendations,
    }))
}
