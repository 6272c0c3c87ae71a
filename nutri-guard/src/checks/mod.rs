//! Built-in field checks.
//!
//! | Check name | Field | Rule |
//! |---|---|---|
//! | `name_present` | `name` | non-empty string |
//! | `categories_present` | `categories` | non-empty string after trimming |
//! | `nutri_score_valid` | `nutri_score` | absent, or exactly one alphabet letter |
//! | `green_score_valid` | `green_score_letter` | absent, or prefixed and ending with an alphabet letter |
//! | `main_nutrients_present` | `nutrients_100g` | required nutrients covered by known keys |

mod nutrients;
mod presence;
mod score;

pub use nutrients::MainNutrientsCheck;
pub use presence::PresenceCheck;
pub use score::{GreenScoreCheck, ScoreLetterCheck};
