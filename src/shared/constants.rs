//! Fixed vocabularies and upload policy for the document archive.
//!
//! The lists below are the contract with the AI classifier and the fallback
//! generator. They are wrapped in small policy structs so services receive
//! them by injection instead of reaching for globals; tests can construct
//! narrowed variants.

/// Accepted `(MIME type, extensions)` pairs for uploads.
pub const ACCEPTED_FILE_TYPES: &[(&str, &[&str])] = &[
    ("application/pdf", &[".pdf"]),
    ("image/jpeg", &[".jpg", ".jpeg"]),
    ("image/png", &[".png"]),
    ("image/gif", &[".gif"]),
    ("image/webp", &[".webp"]),
    ("text/plain", &[".txt"]),
    ("text/markdown", &[".md"]),
    ("application/msword", &[".doc"]),
];

/// Maximum file size in bytes (10 MiB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Files above this size get the `stor-fil` tag in fallback metadata
pub const LARGE_FILE_THRESHOLD: usize = 5 * 1024 * 1024;

/// Files below this size get the `liten-fil` tag in fallback metadata
pub const SMALL_FILE_THRESHOLD: usize = 100 * 1024;

/// Maximum number of tags kept on a classification result
pub const MAX_TAGS: usize = 10;

/// Predefined categories for Norwegian immigration documents
pub const PREDEFINED_CATEGORIES: &[&str] = &[
    // Identity documents
    "Identifikasjonsbevis",
    "Pass",
    "Nasjonalt ID-kort",
    "Fødselsattest",
    // Residence documents
    "Bostedsattest",
    "Folkeregisterutskrift",
    "Leieavtale",
    "Eiendomsdokument",
    // Work documents
    "Arbeidskontrakt",
    "Arbeidsavtale",
    "Lønnslipp",
    "Skatteattest",
    "Arbeidsgiverbekreftelse",
    // Education documents
    "Vitnemål",
    "Karakterutskrift",
    "Utdanningsbevis",
    "Kursbevis",
    // Family documents
    "Vigselsattest",
    "Skilsmissepapirer",
    "Samboerbekreftelse",
    "Barneattest",
    // Financial documents
    "Bankkontoutskrift",
    "Lånedokument",
    "Forsikringsbevis",
    "Pensjonsdokument",
    // Health documents
    "Helseattest",
    "Vaksinasjonsbevis",
    "Medisinsk dokumentasjon",
    // Legal documents
    "Fullmakt",
    "Juridisk dokument",
    "Rettslig bekreftelse",
    // Other official documents
    "Offentlig dokument",
    "Kommunal attest",
    "Politiattest",
];

/// Category used when nothing more specific applies
pub const DEFAULT_CATEGORY: &str = "Offentlig dokument";

/// Tag applied when a classification result ends up with no tags at all
pub const DEFAULT_TAG: &str = "dokument";

/// Predefined sensitive-data tags for privacy protection
pub const PREDEFINED_SENSITIVE_DATA_TAGS: &[&str] = &[
    "navn",
    "fornavn",
    "etternavn",
    "fødselsnummer",
    "personnummer",
    "fødselsdato",
    "alder",
    "kjønn",
    "sivilstand",
    "statsborgerskap",
    "adresse",
    "postadresse",
    "bostedsadresse",
    "postnummer",
    "poststed",
    "telefonnummer",
    "mobilnummer",
    "e-post",
    "epostadresse",
    "lønn",
    "inntekt",
    "bankkonto",
    "kontonummer",
    "beløp",
    "ektefelle",
    "partner",
    "barn",
    "foreldre",
    "familie",
    "pårørende",
    "verge",
    "signatur",
];

/// Predefined general tags for document classification (non-sensitive)
pub const PREDEFINED_TAGS: &[&str] = &[
    "kommune",
    "fylke",
    "land",
    "arbeidsgiver",
    "stilling",
    "arbeidssted",
    "ansettelsesdato",
    "arbeidsperiode",
    "yrke",
    "bransje",
    "utdanning",
    "skole",
    "universitet",
    "studieretning",
    "karakter",
    "eksamen",
    "grad",
    "kurs",
    "valuta",
    "skatt",
    "avgift",
    "forsikring",
    "utstedt",
    "gyldig",
    "utløper",
    "stempel",
    "bekreftelse",
    "attestert",
    "oversatt",
    "myndighet",
    "offentlig",
    "juridisk",
    "lovlig",
    "godkjent",
    "registrert",
    "autorisert",
    "dokument",
    "pdf",
    "bilde",
    "tekst",
    "visuell",
    "grafisk",
    "foto",
    "komprimert",
    "gjennomsiktig",
    "viktig",
    "arkivert",
    "behandlet",
    "gjennomgått",
    "delt",
    "stor-fil",
    "liten-fil",
];

/// Pool the fallback classifier draws its one random tag from
pub const FALLBACK_RANDOM_TAG_POOL: &[&str] =
    &["viktig", "arkivert", "behandlet", "gjennomgått", "delt"];

/// Upload acceptance policy, injected into the validator and handlers.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub accepted_types: &'static [(&'static str, &'static [&'static str])],
    pub max_file_size: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            accepted_types: ACCEPTED_FILE_TYPES,
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

/// Classification vocabulary, injected into the analysis and fallback
/// services.
#[derive(Debug, Clone)]
pub struct ClassificationVocabulary {
    pub categories: &'static [&'static str],
    pub tags: &'static [&'static str],
    pub sensitive_data_tags: &'static [&'static str],
    pub default_category: &'static str,
    pub default_tag: &'static str,
    pub max_tags: usize,
}

impl Default for ClassificationVocabulary {
    fn default() -> Self {
        Self {
            categories: PREDEFINED_CATEGORIES,
            tags: PREDEFINED_TAGS,
            sensitive_data_tags: PREDEFINED_SENSITIVE_DATA_TAGS,
            default_category: DEFAULT_CATEGORY,
            default_tag: DEFAULT_TAG,
            max_tags: MAX_TAGS,
        }
    }
}

impl ClassificationVocabulary {
    /// Membership test against the fixed category list
    pub fn is_predefined_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| *c == category)
    }
}
