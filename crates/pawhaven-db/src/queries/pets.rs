use crate::models::{NewPet, PetRow};
use crate::{Database, OptionalExt, now};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use tracing::warn;

/// Pet columns qualified with the `p` alias, so other modules can join pets
/// and read them back with [`map_pet_at`].
pub(crate) const PET_COLUMNS: &str = "p.id, p.owner_id, p.name, p.species, p.breed, p.age, \
     p.gender, p.color, p.size, p.temperament, p.activity_level, p.description, p.is_adopted, \
     p.images, p.created_at, p.updated_at";

impl Database {
    pub fn create_pet(&self, pet: &NewPet) -> Result<()> {
        self.with_conn(|conn| insert_pet(conn, pet))
    }

    pub fn get_pet(&self, id: &str) -> Result<Option<PetRow>> {
        self.with_conn(|conn| query_pet(conn, id))
    }

    pub fn list_pets_by_owner(&self, owner_id: &str) -> Result<Vec<PetRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PET_COLUMNS} FROM pets p WHERE p.owner_id = ?1 ORDER BY p.created_at ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner_id], |row| map_pet_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Recommendation candidates: every pet still up for adoption that the
    /// given user does not own, in insertion order.
    pub fn list_adoptable_pets(&self, exclude_owner: &str) -> Result<Vec<PetRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PET_COLUMNS} FROM pets p
                 WHERE p.is_adopted = 0 AND p.owner_id != ?1
                 ORDER BY p.created_at ASC, p.rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([exclude_owner], |row| map_pet_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Write back every mutable column of `pet` and bump `updated_at`.
    pub fn update_pet(&self, pet: &PetRow) -> Result<bool> {
        let images = serde_json::to_string(&pet.images)?;
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE pets SET name = ?1, species = ?2, breed = ?3, age = ?4, gender = ?5,
                    color = ?6, size = ?7, temperament = ?8, activity_level = ?9,
                    description = ?10, is_adopted = ?11, images = ?12, updated_at = ?13
                 WHERE id = ?14",
                params![
                    pet.name,
                    pet.species,
                    pet.breed,
                    pet.age,
                    pet.gender,
                    pet.color,
                    pet.size,
                    pet.temperament,
                    pet.activity_level,
                    pet.description,
                    pet.is_adopted,
                    images,
                    now(),
                    pet.id,
                ],
            )?;
            Ok(n > 0)
        })
    }

    /// Flip `is_adopted`. Returns false when the pet was already adopted or
    /// does not exist.
    pub fn mark_pet_adopted(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| set_pet_adopted(conn, id))
    }

    pub fn delete_pet(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM pets WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

pub(crate) fn insert_pet(conn: &Connection, pet: &NewPet) -> Result<()> {
    let images = serde_json::to_string(&pet.images)?;
    let ts = now();
    conn.execute(
        "INSERT INTO pets (id, owner_id, name, species, breed, age, gender, color, size,
            temperament, activity_level, description, images, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
        params![
            pet.id,
            pet.owner_id,
            pet.name,
            pet.species,
            pet.breed,
            pet.age,
            pet.gender,
            pet.color,
            pet.size,
            pet.temperament,
            pet.activity_level,
            pet.description,
            images,
            ts,
        ],
    )?;
    Ok(())
}

pub(crate) fn query_pet(conn: &Connection, id: &str) -> Result<Option<PetRow>> {
    let sql = format!("SELECT {PET_COLUMNS} FROM pets p WHERE p.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([id], |row| map_pet_at(row, 0)).optional()
}

pub(crate) fn set_pet_adopted(conn: &Connection, id: &str) -> Result<bool> {
    let n = conn.execute(
        "UPDATE pets SET is_adopted = 1, updated_at = ?1 WHERE id = ?2 AND is_adopted = 0",
        params![now(), id],
    )?;
    Ok(n > 0)
}

/// Read a pet starting at column `offset`.
pub(crate) fn map_pet_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<PetRow> {
    let id: String = row.get(offset)?;
    let raw_images: String = row.get(offset + 13)?;
    let images = serde_json::from_str(&raw_images).unwrap_or_else(|e| {
        warn!("Pet {} has malformed images column: {}", id, e);
        Vec::new()
    });

    Ok(PetRow {
        id,
        owner_id: row.get(offset + 1)?,
        name: row.get(offset + 2)?,
        species: row.get(offset + 3)?,
        breed: row.get(offset + 4)?,
        age: row.get(offset + 5)?,
        gender: row.get(offset + 6)?,
        color: row.get(offset + 7)?,
        size: row.get(offset + 8)?,
        temperament: row.get(offset + 9)?,
        activity_level: row.get(offset + 10)?,
        description: row.get(offset + 11)?,
        is_adopted: row.get(offset + 12)?,
        images,
        created_at: row.get(offset + 14)?,
        updated_at: row.get(offset + 15)?,
    })
}

#[cfg(test)]
pub(crate) fn sample_pet(id: &str, owner_id: &str) -> NewPet {
    NewPet {
        id: id.into(),
        owner_id: owner_id.into(),
        name: format!("pet-{id}"),
        species: "Dog".into(),
        breed: None,
        age: Some(12),
        gender: "Unknown".into(),
        color: None,
        size: Some("medium".into()),
        temperament: Some("calm".into()),
        activity_level: Some("low".into()),
        description: None,
        images: vec!["https://img.example/a.jpg".into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, user};

    #[test]
    fn images_survive_a_round_trip_through_update() {
        let db = db();
        user(&db, "owner");
        db.create_pet(&sample_pet("p1", "owner")).unwrap();

        let mut pet = db.get_pet("p1").unwrap().unwrap();
        assert_eq!(pet.images, vec!["https://img.example/a.jpg".to_string()]);

        pet.images.push("https://img.example/b.jpg".into());
        pet.name = "Rex".into();
        assert!(db.update_pet(&pet).unwrap());

        let pet = db.get_pet("p1").unwrap().unwrap();
        assert_eq!(pet.name, "Rex");
        assert_eq!(pet.images.len(), 2);
    }

    #[test]
    fn mark_adopted_only_changes_once() {
        let db = db();
        user(&db, "owner");
        db.create_pet(&sample_pet("p1", "owner")).unwrap();

        assert!(db.mark_pet_adopted("p1").unwrap());
        assert!(!db.mark_pet_adopted("p1").unwrap());
        assert!(db.get_pet("p1").unwrap().unwrap().is_adopted);
    }

    #[test]
    fn adoptable_excludes_own_and_adopted() {
        let db = db();
        user(&db, "alice");
        user(&db, "bob");
        db.create_pet(&sample_pet("a1", "alice")).unwrap();
        db.create_pet(&sample_pet("b1", "bob")).unwrap();
        db.create_pet(&sample_pet("b2", "bob")).unwrap();
        db.mark_pet_adopted("b2").unwrap();

        let ids: Vec<_> = db
            .list_adoptable_pets("alice")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["b1".to_string()]);
    }
}
