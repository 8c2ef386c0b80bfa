use crate::Database;
use crate::models::PlatformStats;
use anyhow::Result;

impl Database {
    /// Headline counters for the landing page.
    pub fn platform_stats(&self) -> Result<PlatformStats> {
        self.with_conn(|conn| {
            let resolved_rescues = conn.query_row(
                "SELECT COUNT(*) FROM rescue_reports WHERE status = 'Resolved'",
                [],
                |r| r.get(0),
            )?;
            let completed_adoptions = conn.query_row(
                "SELECT COUNT(DISTINCT pet_id) FROM adoption_requests WHERE status = 'Completed'",
                [],
                |r| r.get(0),
            )?;
            let located_strays = conn.query_row(
                "SELECT COUNT(*) FROM stray_map_entries WHERE location_type = 'stray_animal'",
                [],
                |r| r.get(0),
            )?;
            Ok(PlatformStats {
                resolved_rescues,
                completed_adoptions,
                located_strays,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewChat;
    use crate::queries::rescue::sample_rescue;
    use crate::queries::test_support::{db, user};

    #[test]
    fn counts_only_settled_activity() {
        let db = db();
        user(&db, "alice");
        for id in ["r1", "r2"] {
            db.create_rescue_report(
                &sample_rescue(id, "alice", None),
                &NewChat {
                    id: format!("chat-{id}"),
                    kind: "rescue".into(),
                    related_entity_id: Some(id.into()),
                    creator_id: "alice".into(),
                },
            )
            .unwrap();
        }
        let mut r1 = db.get_rescue_report("r1").unwrap().unwrap();
        r1.status = "Resolved".into();
        db.update_rescue_report(&r1).unwrap();

        let stats = db.platform_stats().unwrap();
        assert_eq!(
            stats,
            PlatformStats {
                resolved_rescues: 1,
                completed_adoptions: 0,
                located_strays: 0,
            }
        );
    }
}
