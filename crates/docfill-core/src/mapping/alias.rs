//! Domain synonym table for the alias strategy.
//!
//! Maps a canonical placeholder key (or a single word of one) to candidate
//! answer keys, in preference order. The built-in entries cover common
//! estate-planning vocabulary; deployments extend or override them through
//! `[mapping.aliases]` in `config.toml`.

use std::collections::HashMap;

use crate::template::normalize::to_canonical;

const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    ("grantor", &["grantor_name", "full_name", "client_name", "name", "trustor_name"]),
    ("grantor_name", &["grantor", "full_name", "client_name", "name", "trustor_name"]),
    ("trustor", &["trustor_name", "grantor_name", "full_name", "client_name", "name"]),
    ("trustor_name", &["trustor", "grantor_name", "full_name", "client_name", "name"]),
    ("settlor", &["settlor_name", "grantor_name", "full_name", "client_name", "name"]),
    ("testator", &["testator_name", "full_name", "client_name", "name"]),
    ("principal", &["principal_name", "full_name", "client_name", "name"]),
    ("client", &["client_name", "full_name", "name"]),
    ("client_name", &["full_name", "name", "client"]),
    ("full_name", &["name", "client_name", "legal_name"]),
    ("name", &["full_name", "client_name", "legal_name"]),
    ("spouse", &["spouse_name", "spouse_full_name", "partner_name"]),
    ("spouse_name", &["spouse", "spouse_full_name", "partner_name"]),
    ("trustee", &["trustee_name", "successor_trustee", "initial_trustee"]),
    ("successor_trustee", &["successor_trustees", "alternate_trustee", "trustee", "trustee_name"]),
    ("successor_trustees", &["successor_trustee", "alternate_trustees", "trustees"]),
    ("executor", &["executor_name", "personal_representative", "executor_names"]),
    ("agent", &["agent_name", "attorney_in_fact", "health_care_agent"]),
    ("beneficiary", &["beneficiaries", "beneficiary_name", "beneficiary_names"]),
    ("beneficiaries", &["beneficiary", "beneficiary_names", "children"]),
    ("guardian", &["guardian_name", "guardians"]),
    ("address", &["street_address", "home_address", "mailing_address", "residence_address"]),
    ("city", &["residence_city", "home_city"]),
    ("county", &["residence_county", "county_of_residence"]),
    ("state", &["residence_state", "state_of_residence", "home_state"]),
    ("phone", &["phone_number", "telephone", "mobile_phone", "cell_phone"]),
    ("email", &["email_address", "e_mail"]),
    ("date_of_birth", &["dob", "birth_date", "birthdate", "birthday"]),
    ("dob", &["date_of_birth", "birth_date", "birthdate"]),
    ("trust_name", &["name_of_trust", "trust_title"]),
    ("date", &["signing_date", "effective_date", "execution_date", "todays_date"]),
];

/// Injectable synonym table. Keys and candidates are stored canonicalized.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, Vec<String>>,
}

impl AliasTable {
    /// An empty table (the alias strategy never matches).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in estate-planning synonyms.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (key, candidates) in BUILTIN_ALIASES {
            table.append(key, candidates.iter().copied());
        }
        table
    }

    /// Layer configured entries on top of this table.
    ///
    /// For a key present in both, the configured candidates are tried first
    /// and the existing candidates after them.
    pub fn with_overrides(mut self, overrides: &HashMap<String, Vec<String>>) -> Self {
        for (key, candidates) in overrides {
            let key = to_canonical(key);
            let mut merged: Vec<String> = candidates.iter().map(|c| to_canonical(c)).collect();
            if let Some(existing) = self.entries.remove(&key) {
                merged.extend(existing);
            }
            merged.retain(|c| !c.is_empty());
            dedup_in_order(&mut merged);
            self.entries.insert(key, merged);
        }
        self
    }

    /// Add candidates after any already registered for `key`.
    pub fn append<'a>(&mut self, key: &str, candidates: impl IntoIterator<Item = &'a str>) {
        let list = self.entries.entry(to_canonical(key)).or_default();
        list.extend(
            candidates
                .into_iter()
                .map(to_canonical)
                .filter(|c| !c.is_empty()),
        );
        dedup_in_order(list);
    }

    /// Candidate answer keys for a canonical key, in preference order.
    pub fn candidates(&self, canonical_key: &str) -> &[String] {
        self.entries
            .get(canonical_key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn dedup_in_order(list: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    list.retain(|item| seen.insert(item.clone()));
}
