use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::identity::resolve_image_url;
use crate::models::{BoardRestriction, DbBoardActivity, DbBoardSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BoardSummary {
  pub id: String,
  pub realm_id: String,
  pub slug: String,
  pub tagline: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub accent_color: Option<String>,
  pub delisted: bool,
  pub logged_in_only: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub muted: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pinned: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BoardNotifications {
  pub id: String,
  pub has_updates: bool,
  pub is_outdated: bool,
  pub last_activity_at: Option<DateTime<Utc>>,
  pub last_activity_from_others_at: Option<DateTime<Utc>>,
  pub last_visited_at: Option<DateTime<Utc>>,
}

/// Builds the sidebar entries of a realm.
///
/// Delisted boards are left out unless the viewer pinned them. Per-viewer
/// fields are only filled in for logged in viewers.
pub fn process_boards_summary(
  realm_id: &str,
  boards: &[DbBoardSummary],
  is_logged_in: bool,
) -> Vec<BoardSummary> {
  boards
    .iter()
    .filter_map(|board| {
      let delisted = if is_logged_in {
        BoardRestriction::Delist.is_in(&board.logged_in_base_restrictions)
      } else {
        BoardRestriction::Delist.is_in(&board.logged_out_restrictions)
      };

      if delisted && board.pinned_order.is_none() {
        return None;
      }

      Some(BoardSummary {
        id: board.string_id.clone(),
        realm_id: realm_id.to_string(),
        slug: board.slug.clone(),
        tagline: board.tagline.clone(),
        avatar_url: board.avatar_reference_id.as_deref().map(resolve_image_url),
        accent_color: board.settings.accent_color.clone(),
        delisted,
        logged_in_only: BoardRestriction::LockAccess.is_in(&board.logged_out_restrictions),
        muted: is_logged_in.then_some(board.muted),
        pinned: is_logged_in.then_some(board.pinned_order.is_some()),
      })
    })
    .collect()
}

pub fn process_boards_notifications(boards: &[DbBoardActivity]) -> Vec<BoardNotifications> {
  boards
    .iter()
    .map(|board| BoardNotifications {
      id: board.string_id.clone(),
      has_updates: board.has_updates,
      is_outdated: match (board.last_activity_from_others, board.last_visit) {
        (Some(from_others), Some(visit)) => visit >= from_others,
        _ => false,
      },
      last_activity_at: board.last_activity,
      last_activity_from_others_at: board.last_activity_from_others,
      last_visited_at: board.last_visit,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::BoardSettings;
  use chrono::TimeZone;
  use sqlx::types::Json;

  fn board(slug: &str, logged_out: &[&str], logged_in: &[&str], pinned: Option<i64>) -> DbBoardSummary {
    DbBoardSummary {
      string_id: format!("{slug}-id"),
      slug: slug.into(),
      tagline: "Everything goes".into(),
      avatar_reference_id: Some("villains.png".into()),
      settings: Json(BoardSettings {
        accent_color: Some("#7b00ff".into()),
      }),
      logged_out_restrictions: logged_out.iter().map(ToString::to_string).collect(),
      logged_in_base_restrictions: logged_in.iter().map(ToString::to_string).collect(),
      muted: true,
      pinned_order: pinned,
    }
  }

  #[test]
  fn logged_out_viewers_lose_delisted_boards() {
    let boards = [
      board("gore", &[], &[], None),
      board("restricted", &["delist"], &[], None),
      board("memes", &["lock_access"], &[], None),
    ];
    let summary = process_boards_summary("realm", &boards, false);

    let slugs = summary.iter().map(|v| v.slug.as_str()).collect::<Vec<_>>();
    assert_eq!(slugs, ["gore", "memes"]);
    assert!(summary[1].logged_in_only);
    assert_eq!(summary[0].avatar_url.as_deref(), Some("/villains.png"));
    assert_eq!(summary[0].muted, None);
    assert_eq!(summary[0].pinned, None);
  }

  #[test]
  fn pinned_boards_survive_delisting() {
    let boards = [
      board("restricted", &[], &["delist"], Some(1)),
      board("delisted", &[], &["delist"], None),
    ];
    let summary = process_boards_summary("realm", &boards, true);

    assert_eq!(summary.len(), 1);
    assert!(summary[0].delisted);
    assert_eq!(summary[0].pinned, Some(true));
    assert_eq!(summary[0].muted, Some(true));
    assert_eq!(summary[0].accent_color.as_deref(), Some("#7b00ff"));
  }

  #[test]
  fn outdated_only_when_both_times_are_known() {
    let earlier = Utc.with_ymd_and_hms(2021, 5, 1, 0, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2021, 5, 2, 0, 0, 0).unwrap();
    let activity = |from_others, visit| DbBoardActivity {
      string_id: "gore".into(),
      has_updates: true,
      last_activity: Some(later),
      last_activity_from_others: from_others,
      last_visit: visit,
    };

    let result = process_boards_notifications(&[
      activity(Some(earlier), Some(later)),
      activity(Some(later), Some(earlier)),
      activity(None, Some(later)),
      activity(Some(earlier), None),
    ]);
    let outdated = result.iter().map(|v| v.is_outdated).collect::<Vec<_>>();
    assert_eq!(outdated, [true, false, false, false]);
  }
}
