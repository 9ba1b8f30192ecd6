use sea_orm::*;

use crate::models::watchlist;

pub struct WatchlistService;

impl WatchlistService {
    /// Liste de surveillance d'un utilisateur, en ordre d'insertion
    pub async fn list(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<watchlist::Model>, DbErr> {
        watchlist::Entity::find()
            .filter(watchlist::Column::UserId.eq(user_id))
            .order_by_asc(watchlist::Column::Id)
            .all(db)
            .await
    }

    /// Ajoute un symbole. Idempotent: si le symbole est déjà suivi on retourne
    /// la ligne existante sans insérer (add puis remove ramène donc toujours
    /// la liste à son état antérieur).
    pub async fn add(
        db: &DatabaseConnection,
        user_id: i32,
        symbol: &str,
        name: Option<String>,
    ) -> Result<watchlist::Model, DbErr> {
        let symbol = symbol.to_uppercase();

        // 1. Vérifier si le symbole est déjà dans la liste
        let existing = watchlist::Entity::find()
            .filter(watchlist::Column::UserId.eq(user_id))
            .filter(watchlist::Column::Symbol.eq(&symbol))
            .one(db)
            .await?;

        if let Some(entry) = existing {
            return Ok(entry);
        }

        // 2. Sinon, insérer la nouvelle entrée
        let new_entry = watchlist::ActiveModel {
            user_id: Set(user_id),
            symbol: Set(symbol),
            name: Set(name),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        new_entry.insert(db).await
    }

    /// Retire un symbole; retourne le nombre de lignes supprimées
    pub async fn remove(
        db: &DatabaseConnection,
        user_id: i32,
        symbol: &str,
    ) -> Result<u64, DbErr> {
        let result = watchlist::Entity::delete_many()
            .filter(watchlist::Column::UserId.eq(user_id))
            .filter(watchlist::Column::Symbol.eq(symbol.to_uppercase()))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: i32, symbol: &str) -> watchlist::Model {
        watchlist::Model {
            id,
            user_id: 1,
            symbol: symbol.to_string(),
            name: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_add_is_idempotent_for_existing_symbol() {
        let existing = entry(3, "AAPL");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .into_connection();

        let result = WatchlistService::add(&db, 1, "aapl", None).await.unwrap();

        // L'entrée existante est retournée telle quelle, aucun insert émis
        assert_eq!(result, existing);
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_prior_set() {
        let prior = vec![entry(1, "MSFT")];
        let added = entry(2, "AAPL");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // list() avant
            .append_query_results([prior.clone()])
            // add(): pas d'entrée existante
            .append_query_results([Vec::<watchlist::Model>::new()])
            // add(): insert retournant la nouvelle ligne
            .append_query_results([vec![added.clone()]])
            // list() après remove
            .append_query_results([prior.clone()])
            // remove(): une ligne supprimée
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let before = WatchlistService::list(&db, 1).await.unwrap();
        let inserted = WatchlistService::add(&db, 1, "AAPL", None).await.unwrap();
        assert_eq!(inserted.symbol, "AAPL");

        let removed = WatchlistService::remove(&db, 1, "AAPL").await.unwrap();
        assert_eq!(removed, 1);

        let after = WatchlistService::list(&db, 1).await.unwrap();
        assert_eq!(before, after);
    }
}
