//! Chunking dispatch (§4.2): picks a chunker by extension and content
//! class, implementing the `glimpse_domain::Chunker` contract.

pub mod ast;
pub mod character;
pub mod languages;
pub mod markdown;

use async_trait::async_trait;
use glimpse_domain::traits::Chunker;
use glimpse_domain::{Chunk, ChunkingProfile, ContentClass, Result};

/// Dispatches to the markdown, AST, or character chunker per extension,
/// using the profile for the file's content class.
pub struct DispatchChunker {
    code_profile: ChunkingProfile,
    docs_profile: ChunkingProfile,
}

impl DispatchChunker {
    pub fn new() -> Self {
        Self { code_profile: ChunkingProfile::code(), docs_profile: ChunkingProfile::docs() }
    }

    pub fn classify(path: &str) -> ContentClass {
        let ext = std::path::Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "md" | "mdx" | "txt" | "rst" => ContentClass::Docs,
            _ => ContentClass::Code,
        }
    }
}

impl Default for DispatchChunker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Chunker for DispatchChunker {
    async fn chunk(&self, path: &str, content: &str, content_hash: &str) -> Result<Vec<Chunk>> {
        let ext = std::path::Path::new(path).extension().and_then(|e| e.to_str()).unwrap_or("");

        if ext == "md" || ext == "mdx" {
            return Ok(markdown::split(path, content, content_hash, &self.docs_profile));
        }

        if let Some(chunks) = ast::split(path, content, content_hash, &self.code_profile) {
            return Ok(chunks);
        }

        let class = Self::classify(path);
        let profile = match class {
            ContentClass::Code => &self.code_profile,
            ContentClass::Docs => &self.docs_profile,
        };
        Ok(character::split(path, content, content_hash, class, profile, 1))
    }
}
