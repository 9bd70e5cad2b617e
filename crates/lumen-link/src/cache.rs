use std::collections::HashMap;

use crate::error::LinkError;
use crate::link::{merge_stage_uniforms, LinkInput, LinkOptions, LinkedShader, ShaderLinker};
use crate::scan::scan;
use crate::scope::scope_provider;
use crate::stage::ShaderStage;
use crate::tables::LinkTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCacheLookupSource {
    /// The linked shader was already present in the in-memory cache.
    Memory,
    /// The linker ran and the output was inserted into the in-memory cache.
    Linked,
}

#[derive(Debug)]
pub struct LinkCacheLookup<'a> {
    pub source: LinkCacheLookupSource,
    shader: &'a LinkedShader,
}

impl std::ops::Deref for LinkCacheLookup<'_> {
    type Target = LinkedShader;

    fn deref(&self) -> &Self::Target {
        self.shader
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// In-memory cache of link results keyed by the content of everything a link reads.
#[derive(Debug, Default)]
pub struct LinkCache {
    map: HashMap<blake3::Hash, LinkedShader>,
    linker: ShaderLinker,
    stats: LinkCacheStats,
}

impl LinkCache {
    pub fn new(options: LinkOptions) -> Self {
        Self::with_linker(ShaderLinker::new(options))
    }

    pub fn with_linker(linker: ShaderLinker) -> Self {
        Self {
            map: HashMap::new(),
            linker,
            stats: LinkCacheStats::default(),
        }
    }

    pub fn linker(&self) -> &ShaderLinker {
        &self.linker
    }

    pub fn options(&self) -> &LinkOptions {
        self.linker.options()
    }

    pub fn set_options(&mut self, options: LinkOptions) {
        if *self.linker.options() != options {
            let tables: LinkTables = self.linker.tables().clone();
            self.linker = ShaderLinker::with_tables(tables, options);
            self.map.clear();
        }
    }

    pub fn stats(&self) -> LinkCacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Failed links are not cached.
    pub fn get_or_link(&mut self, input: &LinkInput<'_>) -> Result<LinkCacheLookup<'_>, LinkError> {
        use std::collections::hash_map::Entry;

        let key = match cache_key(input) {
            Ok(key) => key,
            Err(err) => {
                // Report the same error a direct link would.
                self.stats.misses += 1;
                self.linker.link(input)?;
                return Err(err);
            }
        };
        match self.map.entry(key) {
            Entry::Occupied(e) => {
                self.stats.hits += 1;
                Ok(LinkCacheLookup {
                    source: LinkCacheLookupSource::Memory,
                    shader: e.into_mut(),
                })
            }
            Entry::Vacant(e) => {
                self.stats.misses += 1;
                let linked = self.linker.link(input)?;
                Ok(LinkCacheLookup {
                    source: LinkCacheLookupSource::Linked,
                    shader: e.insert(linked),
                })
            }
        }
    }
}

fn update_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

/// Options are not part of the key: the cache is cleared whenever they change.
///
/// Scopes are keyed by their declaration text and by which scope answers for each uniform the
/// sources declare, since `has_uniform`/`has_texture` are free to disagree with that text.
fn cache_key(input: &LinkInput<'_>) -> Result<blake3::Hash, LinkError> {
    let mut hasher = blake3::Hasher::new();
    update_str(&mut hasher, input.vertex);
    update_str(&mut hasher, input.fragment);

    hasher.update(&(input.attributes.len() as u64).to_le_bytes());
    for (name, &semantic) in input.attributes {
        update_str(&mut hasher, name);
        update_str(&mut hasher, &semantic.to_string());
        match input.vertex_formats.element(semantic) {
            Some(element) => {
                hasher.update(&[1, element.data_type as u8, element.normalized as u8]);
            }
            None => {
                hasher.update(&[0]);
            }
        }
    }

    hasher.update(&(input.scopes.len() as u64).to_le_bytes());
    for scope in input.scopes {
        update_str(&mut hasher, scope.shader_declaration());
    }

    if !input.scopes.is_empty() {
        let vs = scan(input.vertex, ShaderStage::Vertex)?;
        let fs = scan(input.fragment, ShaderStage::Fragment)?;
        for uniform in merge_stage_uniforms(&vs, &fs)? {
            let provider = scope_provider(input.scopes, &uniform).map_or(u64::MAX, |i| i as u64);
            update_str(&mut hasher, &uniform.name);
            hasher.update(&provider.to_le_bytes());
        }
    }

    Ok(hasher.finalize())
}
