use {
    crate::{codec, Remapper, ResolveError, UnitSource},
    interleave_core::{QualifiedName, ShadowNamespace},
    parking_lot::RwLock,
    std::{
        collections::{BTreeSet, HashMap},
        io::ErrorKind,
        sync::Arc,
    },
};

#[derive(Debug, Default)]
struct TypeHeader {
    super_name: Option<String>,
    interfaces: Vec<String>,
    is_interface: bool,
}

/// Answers nearest-common-ancestor queries raised while writing rewritten units.
///
/// Types are looked up directly in the [`UnitSource`] under their *original* names, so resolving
/// never goes through the loader and therefore never triggers another rewrite. Headers are
/// memoized for the lifetime of the resolver.
pub struct HierarchyResolver {
    headers: RwLock<HashMap<String, Arc<TypeHeader>>>,
    remapper: Option<Arc<dyn Remapper>>,
    root: String,
    shadow: ShadowNamespace,
    source: Arc<dyn UnitSource>,
}

impl HierarchyResolver {
    /// The implicit ancestor of every type, in internal form.
    pub const DEFAULT_ROOT: &'static str = "java/lang/Object";

    pub fn new(
        source: Arc<dyn UnitSource>,
        shadow: ShadowNamespace,
        remapper: Option<Arc<dyn Remapper>>,
    ) -> Self {
        HierarchyResolver {
            headers: RwLock::new(HashMap::new()),
            remapper,
            root: Self::DEFAULT_ROOT.to_string(),
            shadow,
            source,
        }
    }

    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into().replace('.', "/");
        self
    }

    pub fn root_type(&self) -> &str {
        &self.root
    }

    /// Returns the nearest common ancestor of two internal type names.
    ///
    /// Shadow names are translated to original names first. The answer is then mapped through
    /// the remapper when one is configured, so that two shadow types get a shadow ancestor.
    pub fn common_ancestor(&self, type1: &str, type2: &str) -> Result<String, ResolveError> {
        let original1 = self.shadow.original_internal(type1);
        let original2 = self.shadow.original_internal(type2);
        let ancestor = self.common_original_ancestor(original1, original2)?;
        Ok(match &self.remapper {
            Some(remapper) => remapper.map(&ancestor),
            None => ancestor,
        })
    }

    fn common_original_ancestor(&self, type1: &str, type2: &str) -> Result<String, ResolveError> {
        if self.is_assignable_from(type1, type2)? {
            return Ok(type1.to_string());
        }
        if self.is_assignable_from(type2, type1)? {
            return Ok(type2.to_string());
        }
        if self.header(type1)?.is_interface || self.header(type2)?.is_interface {
            return Ok(self.root.clone());
        }
        let mut visited = BTreeSet::new();
        let mut current = type1.to_string();
        loop {
            if !visited.insert(current.clone()) {
                return Err(ResolveError::CyclicHierarchy(current));
            }
            current = match &self.header(&current)?.super_name {
                None => return Ok(self.root.clone()),
                Some(super_name) => super_name.clone(),
            };
            if self.is_assignable_from(&current, type2)? {
                return Ok(current);
            }
        }
    }

    /// Whether a value of type `ty` can be used where `target` is expected.
    fn is_assignable_from(&self, target: &str, ty: &str) -> Result<bool, ResolveError> {
        if target == ty || target == self.root {
            return Ok(true);
        }
        Ok(self.ancestors(ty)?.contains(target))
    }

    fn ancestors(&self, ty: &str) -> Result<BTreeSet<String>, ResolveError> {
        let mut ancestors = BTreeSet::new();
        let mut pending = vec![ty.to_string()];
        while let Some(next) = pending.pop() {
            let header = self.header(&next)?;
            for super_type in header.super_name.iter().chain(header.interfaces.iter()) {
                if super_type == ty {
                    return Err(ResolveError::CyclicHierarchy(ty.to_string()));
                }
                if ancestors.insert(super_type.clone()) {
                    pending.push(super_type.clone());
                }
            }
        }
        Ok(ancestors)
    }

    fn header(&self, ty: &str) -> Result<Arc<TypeHeader>, ResolveError> {
        if ty == self.root {
            return Ok(Arc::default());
        }
        if let Some(header) = self.headers.read().get(ty) {
            return Ok(Arc::clone(header));
        }
        let bytes = self
            .source
            .read(&QualifiedName::from(ty))
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => ResolveError::TypeNotFound(ty.to_string()),
                _ => ResolveError::Unreadable {
                    name: ty.to_string(),
                    source,
                },
            })?;
        let unit = codec::decode(&bytes).map_err(|source| ResolveError::Malformed {
            name: ty.to_string(),
            source,
        })?;
        let header = Arc::new(TypeHeader {
            super_name: unit.super_name,
            interfaces: unit.interfaces,
            is_interface: unit.is_interface,
        });
        Ok(Arc::clone(
            self.headers.write().entry(ty.to_string()).or_insert(header),
        ))
    }
}
