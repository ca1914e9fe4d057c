//! Medicine search: semantic name matching against the catalog, plus which
//! registered pharmacies stock each match and where they are.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::MedwiseConfig;
use crate::embedding::{cosine_similarity, create_provider, EmbeddingProvider};
use crate::locator::{distance_km, match_pharmacy, Coordinates, Pharmacy};

const NAME_COLUMN: &str = "medicine_name";
const EMBED_CHUNK: usize = 64;

/// Distinct medicine names, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicineCatalog {
    names: Vec<String>,
}

impl MedicineCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(Into::into)
            .map(|n: String| n.trim().to_string())
            .filter(|n| !n.is_empty() && seen.insert(n.to_lowercase()))
            .collect();
        Self { names }
    }

    /// Reads the `medicine_name` column; other columns are ignored.
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = csv.headers().context("medicine catalog has no header row")?.clone();
        let column = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(NAME_COLUMN))
            .with_context(|| format!("medicine catalog is missing a `{NAME_COLUMN}` column"))?;

        let mut names = Vec::new();
        for record in csv.records() {
            let record = record.context("malformed medicine catalog row")?;
            if let Some(name) = record.get(column) {
                names.push(name.to_string());
            }
        }
        Ok(Self::new(names))
    }

    /// A missing file yields an empty catalog.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "medicine catalog not found");
            return Ok(Self::default());
        }
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let catalog = Self::from_csv_reader(file)
            .with_context(|| format!("failed to read {}", path.display()))?;
        tracing::info!(count = catalog.len(), "medicine catalog loaded");
        Ok(catalog)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicineMatch {
    pub name: String,
    pub score: f32,
}

/// Catalog names with their embeddings, computed once up front.
pub struct MedicineIndex {
    names: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl MedicineIndex {
    pub fn build(catalog: &MedicineCatalog, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let mut embeddings = Vec::with_capacity(catalog.len());
        for chunk in catalog.names().chunks(EMBED_CHUNK) {
            let texts: Vec<&str> = chunk.iter().map(String::as_str).collect();
            let batch = provider.embed_batch(&texts)?;
            anyhow::ensure!(
                batch.len() == texts.len(),
                "embedding provider returned {} vectors for {} names",
                batch.len(),
                texts.len()
            );
            embeddings.extend(batch);
        }
        tracing::info!(count = embeddings.len(), "medicine index built");
        Ok(Self {
            names: catalog.names().to_vec(),
            embeddings,
            provider,
        })
    }

    /// The `top_n` catalog names most similar to `query`. Blank queries match nothing.
    pub fn search(&self, query: &str, top_n: usize) -> Result<Vec<MedicineMatch>> {
        let query = query.trim();
        if query.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.provider.embed(query)?;
        Ok(rank(&query_vec, &self.names, &self.embeddings, top_n))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// [`MedicineIndex::search`] on the blocking pool, for async callers.
pub async fn search_blocking(
    index: Arc<MedicineIndex>,
    query: &str,
    top_n: usize,
) -> Result<Vec<MedicineMatch>> {
    let query = query.to_string();
    tokio::task::spawn_blocking(move || index.search(&query, top_n)).await?
}

/// Whether medicine search can run.
#[derive(Clone)]
pub enum SearchState {
    Ready(Arc<MedicineIndex>),
    Unavailable { reason: String },
}

impl SearchState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn status(&self) -> &'static str {
        if self.is_ready() {
            "ready"
        } else {
            "unavailable"
        }
    }
}

impl std::fmt::Debug for SearchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(index) => f.debug_tuple("Ready").field(&index.len()).finish(),
            Self::Unavailable { reason } => f.debug_struct("Unavailable").field("reason", reason).finish(),
        }
    }
}

/// Load the catalog and embedding model and index every name.
///
/// Never fails: a disabled matcher, a missing model, or an empty catalog
/// leaves search unavailable with the reason logged.
pub fn load_search(config: &MedwiseConfig) -> SearchState {
    if !config.matcher.enabled {
        return SearchState::Unavailable {
            reason: "medicine search is disabled".into(),
        };
    }

    let attempt = || -> Result<MedicineIndex> {
        let catalog = MedicineCatalog::load(&config.data_file(&config.data.medicines))?;
        anyhow::ensure!(!catalog.is_empty(), "medicine catalog is empty");
        let provider: Arc<dyn EmbeddingProvider> = Arc::from(create_provider(&config.matcher)?);
        MedicineIndex::build(&catalog, provider)
    };

    match attempt() {
        Ok(index) => SearchState::Ready(Arc::new(index)),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "medicine search unavailable");
            SearchState::Unavailable {
                reason: format!("{e:#}"),
            }
        }
    }
}

/// Highest cosine similarity first; equal scores keep catalog order.
fn rank(query: &[f32], names: &[String], embeddings: &[Vec<f32>], top_n: usize) -> Vec<MedicineMatch> {
    let mut scored: Vec<MedicineMatch> = names
        .iter()
        .zip(embeddings)
        .map(|(name, emb)| MedicineMatch {
            name: name.clone(),
            score: cosine_similarity(query, emb),
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_n);
    scored
}

/// Where a stocking pharmacy was found, if anywhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StockistLocation {
    Located {
        pharmacy: String,
        listing: String,
        address: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        distance_km: Option<f64>,
        maps_link: String,
    },
    NotMatched {
        pharmacy: String,
    },
}

impl StockistLocation {
    pub fn pharmacy(&self) -> &str {
        match self {
            Self::Located { pharmacy, .. } | Self::NotMatched { pharmacy } => pharmacy,
        }
    }
}

/// Match each stocking pharmacy's name against nearby map listings.
///
/// Distance is reported when the searcher's own position is known.
pub fn locate_stockists(
    stockists: &[String],
    nearby: &[Pharmacy],
    origin: Option<Coordinates>,
    cutoff: f64,
) -> Vec<StockistLocation> {
    stockists
        .iter()
        .map(|name| match match_pharmacy(name, nearby, cutoff) {
            Some(listing) => StockistLocation::Located {
                pharmacy: name.clone(),
                listing: listing.name.clone(),
                address: listing.address.clone(),
                distance_km: origin.map(|o| (distance_km(o, listing.location) * 100.0).round() / 100.0),
                maps_link: listing.maps_link(),
            },
            None => StockistLocation::NotMatched {
                pharmacy: name.clone(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Embeds text as letter-frequency counts over `a..=z`.
    struct LetterEmbedder;

    impl EmbeddingProvider for LetterEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0; 26];
            for c in text.to_ascii_lowercase().chars().filter(char::is_ascii_lowercase) {
                v[(c as u8 - b'a') as usize] += 1.0;
            }
            Ok(v)
        }
    }

    #[test]
    fn catalog_reads_column_and_dedups() {
        let csv = "id,medicine_name,price\n1,Paracetamol,10\n2,Ibuprofen,12\n3, paracetamol ,9\n4,,1\n";
        let catalog = MedicineCatalog::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.names(), &["Paracetamol".to_string(), "Ibuprofen".to_string()]);
    }

    #[test]
    fn catalog_without_name_column_is_an_error() {
        let err = MedicineCatalog::from_csv_reader("drug\nX\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("medicine_name"));
    }

    #[test]
    fn missing_catalog_is_empty() {
        let catalog = MedicineCatalog::load(Path::new("/nonexistent/medicine.csv")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn search_ranks_closest_names_first() {
        let catalog = MedicineCatalog::new(["Cetirizine", "Paracetamol", "Amoxicillin", "Paracetamol Syrup"]);
        let index = MedicineIndex::build(&catalog, Arc::new(LetterEmbedder)).unwrap();
        assert_eq!(index.len(), 4);

        let matches = index.search("paracetamol", 2).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].name, "Paracetamol");
        assert!((matches[0].score - 1.0).abs() < 1e-6);
        assert_eq!(matches[1].name, "Paracetamol Syrup");
    }

    /// Records the thread each query embedding runs on.
    struct ThreadRecorder(std::sync::Mutex<Vec<std::thread::ThreadId>>);

    impl EmbeddingProvider for ThreadRecorder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.0.lock().unwrap().push(std::thread::current().id());
            LetterEmbedder.embed(text)
        }
    }

    #[tokio::test]
    async fn async_search_embeds_off_the_runtime_thread() {
        let recorder = Arc::new(ThreadRecorder(std::sync::Mutex::new(Vec::new())));
        let catalog = MedicineCatalog::new(["Paracetamol", "Cetirizine"]);
        let index = MedicineIndex::build(&catalog, recorder.clone()).unwrap();
        recorder.0.lock().unwrap().clear();

        let matches = search_blocking(Arc::new(index), "paracetamol", 1).await.unwrap();
        assert_eq!(matches[0].name, "Paracetamol");

        let threads = recorder.0.lock().unwrap();
        assert_eq!(threads.len(), 1);
        assert_ne!(threads[0], std::thread::current().id());
    }

    #[test]
    fn blank_query_matches_nothing() {
        let catalog = MedicineCatalog::new(["Cetirizine"]);
        let index = MedicineIndex::build(&catalog, Arc::new(LetterEmbedder)).unwrap();
        assert!(index.search("   ", 5).unwrap().is_empty());
    }

    #[test]
    fn disabled_or_missing_model_leaves_search_unavailable() {
        let mut config = MedwiseConfig::default();
        config.matcher.enabled = false;
        assert!(!load_search(&config).is_ready());

        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("medicine.csv"), "medicine_name\nParacetamol\n").unwrap();
        config.matcher.enabled = true;
        config.data.dir = tmp.path().to_string_lossy().into_owned();
        config.matcher.cache_dir = tmp.path().join("models").to_string_lossy().into_owned();
        match load_search(&config) {
            SearchState::Unavailable { reason } => assert!(reason.contains("model download"), "{reason}"),
            SearchState::Ready(_) => panic!("no model files were provided"),
        }
    }

    #[test]
    fn rank_keeps_catalog_order_on_ties() {
        let names = vec!["b".to_string(), "a".to_string()];
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
        let ranked = rank(&[1.0, 0.0], &names, &embeddings, 5);
        assert_eq!(ranked[0].name, "b");
        assert_eq!(ranked[1].name, "a");
    }

    #[test]
    fn stockists_are_located_or_flagged() {
        let nearby = vec![Pharmacy {
            name: "Apollo Pharmacy".into(),
            address: "MG Road".into(),
            location: Coordinates::new(12.9756, 77.6050),
        }];
        let stockists = vec!["apollo pharmacy".to_string(), "Corner Chemist".to_string()];
        let origin = Coordinates::new(12.9716, 77.5946);

        let located = locate_stockists(&stockists, &nearby, Some(origin), 80.0);
        match &located[0] {
            StockistLocation::Located {
                listing,
                distance_km,
                maps_link,
                ..
            } => {
                assert_eq!(listing, "Apollo Pharmacy");
                let d = distance_km.unwrap();
                assert!(d > 0.5 && d < 2.0, "got {d}");
                assert!(maps_link.ends_with("Apollo+Pharmacy+MG+Road"));
            }
            other => panic!("expected located, got {other:?}"),
        }
        assert_eq!(
            located[1],
            StockistLocation::NotMatched {
                pharmacy: "Corner Chemist".into()
            }
        );
        assert_eq!(located[1].pharmacy(), "Corner Chemist");
    }

    #[test]
    fn no_origin_means_no_distance() {
        let nearby = vec![Pharmacy {
            name: "MedPlus".into(),
            address: "".into(),
            location: Coordinates::new(0.0, 0.0),
        }];
        let located = locate_stockists(&["MedPlus".to_string()], &nearby, None, 80.0);
        let json = serde_json::to_value(&located[0]).unwrap();
        assert_eq!(json["status"], "located");
        assert!(json.get("distance_km").is_none());
    }
}
