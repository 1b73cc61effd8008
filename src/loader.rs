//! Fact files: JSON dumps of one producer's declarations.
//!
//! A fact file lists functions and classes (with their methods). It does not
//! say which producer it came from; the role it is loaded under does:
//!
//! ```json
//! {
//!   "functions": [
//!     { "name": "Ns\\myFunction", "doc_comment": "/** ... */",
//!       "signature": { "parameters": [{ "name": "$x", "type_hint": "int" }],
//!                      "return_type": "string" } }
//!   ],
//!   "classes": [
//!     { "name": "Ns\\Child", "parent": "Ns\\Base",
//!       "methods": [{ "name": "run", "visibility": "protected",
//!                     "doc_comment": "/** ... */" }] }
//!   ]
//! }
//! ```
//!
//! Stub entries carry documentation by contract. A stub entry without a doc
//! comment contributes nothing and is dropped here with a debug log. A stub
//! class entry that overrides the parent edge is kept even without one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use docreflect_core::{
    DeclarationFact, DeclarationRegistry, Producer, ReflectionError, RegistryBuilder, Signature,
    Visibility,
};

use crate::config::ResolvedConfig;

// ============================================================================
// Errors
// ============================================================================

/// Errors from reading fact files and building the registry.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file is not valid fact-file JSON.
    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A stub directory could not be scanned.
    #[error("cannot scan {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The loaded facts are inconsistent.
    #[error("registry error: {0}")]
    Registry(#[from] ReflectionError),
}

// ============================================================================
// File Format
// ============================================================================

/// One fact file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactFile {
    #[serde(default)]
    pub functions: Vec<FunctionEntry>,
    #[serde(default)]
    pub classes: Vec<ClassEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub name: String,
    #[serde(default)]
    pub doc_comment: Option<String>,
    #[serde(default)]
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub doc_comment: Option<String>,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodEntry {
    pub name: String,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub is_static: Option<bool>,
    #[serde(default)]
    pub doc_comment: Option<String>,
    #[serde(default)]
    pub signature: Option<Signature>,
}

impl FactFile {
    /// Parse fact-file JSON.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Convert the entries into facts tagged with `producer`.
    pub fn into_facts(self, producer: Producer) -> Vec<DeclarationFact> {
        let mut facts = Vec::new();

        for entry in self.functions {
            if producer == Producer::Stub && entry.doc_comment.is_none() {
                debug!(function = %entry.name, "skipping stub entry without doc comment");
                continue;
            }
            let mut fact = DeclarationFact::function(producer, &entry.name);
            fact.doc_comment = entry.doc_comment;
            fact.signature = entry.signature;
            facts.push(fact);
        }

        for class in self.classes {
            let overrides_nothing = class.doc_comment.is_none() && class.parent.is_none();
            if producer == Producer::Stub && overrides_nothing {
                debug!(class = %class.name, "skipping stub class entry without doc comment");
            } else {
                let mut fact = DeclarationFact::class(producer, &class.name);
                fact.doc_comment = class.doc_comment;
                if let Some(parent) = &class.parent {
                    fact = fact.with_parent(parent);
                }
                facts.push(fact);
            }

            for method in class.methods {
                if producer == Producer::Stub && method.doc_comment.is_none() {
                    debug!(
                        class = %class.name,
                        method = %method.name,
                        "skipping stub entry without doc comment"
                    );
                    continue;
                }
                let mut fact = DeclarationFact::method(producer, &class.name, &method.name);
                fact.doc_comment = method.doc_comment;
                fact.visibility = method.visibility;
                fact.is_static = method.is_static;
                fact.signature = method.signature;
                facts.push(fact);
            }
        }

        facts
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Read and parse one fact file.
pub fn read_fact_file(path: &Path) -> Result<FactFile, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FactFile::from_json(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read one fact file and tag its entries with `producer`.
pub fn load_facts(path: &Path, producer: Producer) -> Result<Vec<DeclarationFact>, LoadError> {
    let facts = read_fact_file(path)?.into_facts(producer);
    debug!(path = %path.display(), %producer, count = facts.len(), "loaded fact file");
    Ok(facts)
}

/// All `*.json` files under `dir`, recursively, in sorted order.
pub fn collect_stub_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Load every configured fact file and build the registry.
pub fn load_registry(config: &ResolvedConfig) -> Result<DeclarationRegistry, LoadError> {
    let mut builder = RegistryBuilder::new().with_options(config.registry_options());

    for path in config.source_fact_paths() {
        builder.extend(load_facts(path, Producer::Source)?)?;
    }
    for path in config.native_fact_paths() {
        builder.extend(load_facts(path, Producer::Native)?)?;
    }

    let mut stub_files: Vec<PathBuf> = config
        .stub_file_paths()
        .into_iter()
        .map(Path::to_path_buf)
        .collect();
    for dir in config.stub_dir_paths() {
        stub_files.extend(collect_stub_files(dir)?);
    }
    info!(count = stub_files.len(), "loading stub files");
    for path in &stub_files {
        builder.extend(load_facts(path, Producer::Stub)?)?;
    }

    Ok(builder.build()?)
}
