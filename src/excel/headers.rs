//! Header aliasing: literal spreadsheet headers → canonical fields
//!
//! The accepted spellings for each field are a fixed table. Matching is
//! exact after whitespace normalization, so `"Document  demandé"` and
//! `"Document demandé"` are the same header.

use std::collections::HashMap;
use std::fmt;

use crate::error::{IntakeError, IntakeResult};

/// Canonical field of a taxpayer row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    FilingDate,
    UpToDateAtFiling,
    TaxIdentifier,
    LegalName,
    RequestedDocuments,
    QuantityRequested,
    ManagingCenter,
    RegistryArrivalDate,
    DeliveryDate,
    Rejected,
    Observation,
}

impl CanonicalField {
    /// Every field, in declaration order
    pub const ALL: [CanonicalField; 11] = [
        CanonicalField::FilingDate,
        CanonicalField::UpToDateAtFiling,
        CanonicalField::TaxIdentifier,
        CanonicalField::LegalName,
        CanonicalField::RequestedDocuments,
        CanonicalField::QuantityRequested,
        CanonicalField::ManagingCenter,
        CanonicalField::RegistryArrivalDate,
        CanonicalField::DeliveryDate,
        CanonicalField::Rejected,
        CanonicalField::Observation,
    ];

    /// Canonical header name, as reported in missing-header errors
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::FilingDate => "DATE DE DEPOT",
            CanonicalField::UpToDateAtFiling => "LE CONTRIBUABLE EST-IL A JOUR LORS DU DEPOT?",
            CanonicalField::TaxIdentifier => "NIF",
            CanonicalField::LegalName => "RAISON SOCIALE",
            CanonicalField::RequestedDocuments => "Document demandé",
            CanonicalField::QuantityRequested => "Quantité",
            CanonicalField::ManagingCenter => "CENTRE GESTIONNAIRE",
            CanonicalField::RegistryArrivalDate => "DATE D'ARRIVE A IMMAT",
            CanonicalField::DeliveryDate => "DATE DE LIVRAISON AU SERVI. GESTIONNAIRE",
            CanonicalField::Rejected => "REJET",
            CanonicalField::Observation => "OBSERVATION",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepted header variants per canonical field, in declaration order
pub const HEADER_ALIASES: &[(CanonicalField, &[&str])] = &[
    (CanonicalField::FilingDate, &["DATE DE DEPOT"]),
    (
        CanonicalField::UpToDateAtFiling,
        &[
            "LE CONTRIBUABLE EST-IL A JOUR LORS DU DEPOT?",
            "LE CONTRIBUABLE EST-IL A JOUR  LORS DU DEPOT?",
        ],
    ),
    (CanonicalField::TaxIdentifier, &["NIF"]),
    (CanonicalField::LegalName, &["RAISON SOCIALE"]),
    (
        CanonicalField::RequestedDocuments,
        &["Document  demandé", "Document demandé"],
    ),
    (CanonicalField::QuantityRequested, &["Quantité"]),
    (CanonicalField::ManagingCenter, &["CENTRE GESTIONNAIRE"]),
    (CanonicalField::RegistryArrivalDate, &["DATE D'ARRIVE A IMMAT"]),
    (
        CanonicalField::DeliveryDate,
        &["DATE DE LIVRAISON AU SERVI. GESTIONNAIRE"],
    ),
    (CanonicalField::Rejected, &["REJET"]),
    (CanonicalField::Observation, &["OBSERVATION"]),
];

/// Collapse internal whitespace runs to one space and trim both ends
pub fn normalize_header(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical field → literal header present in the uploaded sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMapping {
    headers: HashMap<CanonicalField, String>,
}

impl HeaderMapping {
    /// Literal header for `field`, if it was matched
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.headers.get(&field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    fn insert(&mut self, field: CanonicalField, header: String) {
        self.headers.insert(field, header);
    }
}

/// Resolve every canonical field against the header row.
///
/// Fails with the complete list of unmatched fields, not just the first.
pub fn resolve_headers(found: &[String]) -> IntakeResult<HeaderMapping> {
    resolve_with(HEADER_ALIASES, found)
}

/// Resolve against an explicit alias table
pub fn resolve_with(
    aliases: &[(CanonicalField, &[&str])],
    found: &[String],
) -> IntakeResult<HeaderMapping> {
    let normalized_found: Vec<String> = found.iter().map(|h| normalize_header(h)).collect();

    let mut mapping = HeaderMapping::default();
    let mut missing = Vec::new();

    for (field, variants) in aliases {
        let matched = variants.iter().find_map(|variant| {
            let wanted = normalize_header(variant);
            normalized_found
                .iter()
                .position(|h| *h == wanted)
                .map(|idx| found[idx].clone())
        });

        match matched {
            Some(header) => mapping.insert(*field, header),
            None => missing.push(field.name().to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(IntakeError::MissingHeaders {
            missing,
            found: found.to_vec(),
        });
    }

    Ok(mapping)
}
