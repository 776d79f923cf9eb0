//! Responses from mutating endpoints (claims, starts, admin overrides)

use crate::{Error, Result, Xp};
use serde::{Deserialize, Serialize};

/// Generic body returned by mutating endpoints: `{ success?, error?, xpAwarded? }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, alias = "xp_awarded")]
    pub xp_awarded: Option<i64>,
    #[serde(default)]
    pub card: Option<CollectibleCard>,
}

impl MutationResponse {
    /// Turn an `{error}` body or `success: false` into `RemoteFailure`
    pub fn into_result(self) -> Result<MutationReceipt> {
        if let Some(err) = self.error.filter(|e| !e.is_empty()) {
            return Err(Error::RemoteFailure(err));
        }
        if self.success == Some(false) {
            return Err(Error::RemoteFailure("request was not successful".to_string()));
        }
        Ok(MutationReceipt {
            xp_awarded: Xp(self.xp_awarded.unwrap_or(0)),
            card: self.card,
        })
    }
}

/// What a successful mutation handed back
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationReceipt {
    /// Negative when an admin action reverted a prior award
    pub xp_awarded: Xp,
    pub card: Option<CollectibleCard>,
}

/// Collectible card reference unlocked by a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectibleCard {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body for `POST /events/challenges/{id}/claim`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest<'a> {
    pub xp_amount: Xp,
    pub context: &'a crate::ClaimContext,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_is_remote_failure() {
        let resp: MutationResponse =
            serde_json::from_str(r#"{ "error": "already claimed" }"#).unwrap();
        match resp.into_result() {
            Err(Error::RemoteFailure(msg)) => assert_eq!(msg, "already claimed"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unsuccessful_flag_is_remote_failure() {
        let resp: MutationResponse = serde_json::from_str(r#"{ "success": false }"#).unwrap();
        assert!(resp.into_result().is_err());
    }

    #[test]
    fn receipt_carries_xp_and_card() {
        let resp: MutationResponse = serde_json::from_str(
            r#"{ "success": true, "xpAwarded": -120,
                 "card": { "id": "card-7", "name": "Harbor" } }"#,
        )
        .unwrap();
        let receipt = resp.into_result().unwrap();
        assert_eq!(receipt.xp_awarded, Xp(-120));
        assert_eq!(receipt.card.unwrap().id, "card-7");
    }
}
