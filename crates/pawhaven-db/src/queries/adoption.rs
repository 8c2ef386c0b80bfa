use crate::models::{AdoptionRequestRow, NewAdoptionRequest, NewChat, NewPet, PetRow};
use crate::queries::chats::insert_chat;
use crate::queries::pets::{PET_COLUMNS, insert_pet, map_pet_at, set_pet_adopted};
use crate::{Database, OptionalExt, now};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, params};

const REQUEST_COLUMNS: &str =
    "r.id, r.pet_id, r.requester_id, r.chat_id, r.description, r.status, r.created_at, r.updated_at";

impl Database {
    /// Create the pet, the request and the request's adoption chat in one
    /// transaction. The chat is linked to the request and the request to the
    /// chat.
    pub fn create_adoption_request(
        &self,
        pet: &NewPet,
        request: &NewAdoptionRequest,
        chat: &NewChat,
    ) -> Result<(AdoptionRequestRow, PetRow)> {
        self.with_tx(|conn| {
            insert_pet(conn, pet)?;
            insert_chat(conn, chat)?;
            let ts = now();
            conn.execute(
                "INSERT INTO adoption_requests (id, pet_id, requester_id, chat_id, description,
                    status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'Pending', ?6, ?6)",
                params![request.id, pet.id, request.requester_id, chat.id, request.description, ts],
            )?;
            query_request(conn, "r.id", &request.id)?
                .ok_or_else(|| anyhow!("adoption request {} vanished after insert", request.id))
        })
    }

    pub fn get_adoption_request(&self, id: &str) -> Result<Option<(AdoptionRequestRow, PetRow)>> {
        self.with_conn(|conn| query_request(conn, "r.id", id))
    }

    pub fn get_adoption_request_by_chat(
        &self,
        chat_id: &str,
    ) -> Result<Option<(AdoptionRequestRow, PetRow)>> {
        self.with_conn(|conn| query_request(conn, "r.chat_id", chat_id))
    }

    pub fn list_adoption_requests_by_requester(
        &self,
        requester_id: &str,
    ) -> Result<Vec<(AdoptionRequestRow, PetRow)>> {
        self.with_conn(|conn| query_requests(conn, "r.requester_id = ?1", requester_id))
    }

    /// Requests for pets still up for adoption, excluding `requester_id`'s own.
    pub fn list_open_adoption_requests(
        &self,
        requester_id: &str,
    ) -> Result<Vec<(AdoptionRequestRow, PetRow)>> {
        self.with_conn(|conn| {
            query_requests(conn, "p.is_adopted = 0 AND r.requester_id != ?1", requester_id)
        })
    }

    /// Write back description, status and chat link. When `settle_pet` is set
    /// the pet is flipped to adopted in the same transaction. Returns true
    /// only if this call is the one that adopted the pet.
    pub fn update_adoption_request(
        &self,
        request: &AdoptionRequestRow,
        settle_pet: bool,
    ) -> Result<bool> {
        self.with_tx(|conn| {
            conn.execute(
                "UPDATE adoption_requests SET description = ?1, status = ?2, chat_id = ?3,
                    updated_at = ?4
                 WHERE id = ?5",
                params![
                    request.description,
                    request.status,
                    request.chat_id,
                    now(),
                    request.id,
                ],
            )?;
            if settle_pet {
                set_pet_adopted(conn, &request.pet_id)
            } else {
                Ok(false)
            }
        })
    }

    pub fn delete_adoption_request(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM adoption_requests WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn query_request(
    conn: &Connection,
    column: &str,
    value: &str,
) -> Result<Option<(AdoptionRequestRow, PetRow)>> {
    let sql = format!(
        "SELECT {REQUEST_COLUMNS}, {PET_COLUMNS}
         FROM adoption_requests r JOIN pets p ON p.id = r.pet_id
         WHERE {column} = ?1
         LIMIT 1"
    );
    conn.query_row(&sql, [value], map_request_with_pet).optional()
}

fn query_requests(
    conn: &Connection,
    filter: &str,
    value: &str,
) -> Result<Vec<(AdoptionRequestRow, PetRow)>> {
    let sql = format!(
        "SELECT {REQUEST_COLUMNS}, {PET_COLUMNS}
         FROM adoption_requests r JOIN pets p ON p.id = r.pet_id
         WHERE {filter}
         ORDER BY r.created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([value], map_request_with_pet)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_request_with_pet(row: &Row<'_>) -> rusqlite::Result<(AdoptionRequestRow, PetRow)> {
    let request = AdoptionRequestRow {
        id: row.get(0)?,
        pet_id: row.get(1)?,
        requester_id: row.get(2)?,
        chat_id: row.get(3)?,
        description: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    };
    let pet = map_pet_at(row, 8)?;
    Ok((request, pet))
}
