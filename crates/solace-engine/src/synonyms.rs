//! Synonym groups for paraphrase-tolerant search.
//!
//! The direct tier fails when a user writes "I feel so alone" and the
//! quote is tagged "loneliness". Groups cluster bilingual terms around one
//! concept; a query token matching any term of a group makes every term of
//! that group (and its name) searchable.

use std::collections::BTreeSet;

/// One concept cluster. Terms mix both corpus languages deliberately so a
/// German query can reach English-tagged quotes and vice versa.
#[derive(Debug, Clone)]
pub struct SynonymGroup {
  pub name:  String,
  pub terms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SynonymTable {
  groups: Vec<SynonymGroup>,
}

impl SynonymTable {
  /// Build a table; names and terms are lowercased on the way in.
  pub fn new(groups: impl IntoIterator<Item = SynonymGroup>) -> Self {
    let groups = groups
      .into_iter()
      .map(|g| SynonymGroup {
        name:  g.name.to_lowercase(),
        terms: g.terms.into_iter().map(|t| t.to_lowercase()).collect(),
      })
      .collect();
    Self { groups }
  }

  /// All searchable terms of every group matched by any of `tokens`.
  ///
  /// A token matches a group when it equals the group's name or one of
  /// its terms; the returned set contains the group name plus all terms.
  pub fn expand(&self, tokens: &[String]) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();
    for group in &self.groups {
      let hit = tokens
        .iter()
        .any(|t| t == &group.name || group.terms.iter().any(|s| s == t));
      if hit {
        terms.insert(group.name.clone());
        terms.extend(group.terms.iter().cloned());
      }
    }
    terms
  }
}

impl Default for SynonymTable {
  fn default() -> Self {
    let group = |name: &str, terms: &[&str]| SynonymGroup {
      name:  name.into(),
      terms: terms.iter().map(|t| t.to_string()).collect(),
    };

    Self::new([
      group("loneliness", &[
        "lonely", "alone", "isolation", "einsam", "einsamkeit", "allein",
      ]),
      group("heartbreak", &[
        "breakup", "herzschmerz", "liebeskummer", "trennung",
      ]),
      group("stress", &[
        "pressure", "overwhelmed", "burnout", "druck", "ueberfordert",
        "überfordert",
      ]),
      group("grief", &[
        "loss", "mourning", "death", "trauer", "verlust", "tod",
      ]),
      group("fear", &[
        "afraid", "anxiety", "worry", "angst", "sorge", "furcht",
      ]),
      group("hope", &["hopeless", "despair", "hoffnung", "verzweiflung"]),
      group("justice", &[
        "law", "revenge", "retribution", "gerechtigkeit", "rache",
        "vergeltung",
      ]),
      group("gratitude", &["thankful", "grateful", "dankbar", "dankbarkeit"]),
      group("courage", &["brave", "strength", "mut", "staerke", "tapfer"]),
      group("forgiveness", &["forgive", "vergebung", "verzeihen"]),
    ])
  }
}
