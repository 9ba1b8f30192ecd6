// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Utilisateurs (auth par email)
//   - portfolio_holdings : Positions du portefeuille (parts + prix de revient)
//   - watchlist : Liste de surveillance par utilisateur
//   - feedback : Retours utilisateurs
//   - dto : Data Transfer Objects pour les requêtes/réponses API
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Chaque table métier est clé-étrangère sur users.id
//   - Les champs dérivés du portfolio (valeur, gain) ne sont jamais stockés
//   - Les messages de chat ne sont PAS persistés (mémoire du widget seulement)
//
// ============================================================================

pub mod health;
pub mod users;
pub mod portfolio_holdings;
pub mod watchlist;
pub mod feedback;
pub mod dto;
