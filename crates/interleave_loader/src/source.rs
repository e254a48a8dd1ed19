use {
    crate::{codec, LoadError},
    interleave_core::{Artifact, Origin, QualifiedName, UnitNode},
    parking_lot::RwLock,
    std::{
        collections::HashMap,
        io::{self, ErrorKind},
        path::PathBuf,
        sync::Arc,
    },
    tracing::warn,
};

/// Supplies raw representations keyed by unit name, plus arbitrary resources.
pub trait UnitSource: Send + Sync {
    /// Returns an error of kind [`ErrorKind::NotFound`] for unknown names.
    fn read(&self, name: &QualifiedName) -> io::Result<Vec<u8>>;

    fn resource(&self, path: &str) -> io::Result<Vec<u8>> {
        Err(io::Error::new(ErrorKind::NotFound, path.to_string()))
    }
}

impl<S> UnitSource for Arc<S>
where
    S: UnitSource + ?Sized,
{
    fn read(&self, name: &QualifiedName) -> io::Result<Vec<u8>> {
        (**self).read(name)
    }

    fn resource(&self, path: &str) -> io::Result<Vec<u8>> {
        (**self).resource(path)
    }
}

#[derive(Debug, Default)]
pub struct MemorySource {
    resources: RwLock<HashMap<String, Vec<u8>>>,
    units: RwLock<HashMap<QualifiedName, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<QualifiedName>, bytes: Vec<u8>) {
        self.units.write().insert(name.into(), bytes);
    }

    /// Encodes the unit and stores it under its own name.
    pub fn insert_unit(&self, unit: &UnitNode) -> Result<(), serde_json::Error> {
        let bytes = codec::encode(unit)?;
        self.insert(unit.name.as_str(), bytes);
        Ok(())
    }

    pub fn insert_resource(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.resources.write().insert(path.into(), bytes);
    }
}

impl UnitSource for MemorySource {
    fn read(&self, name: &QualifiedName) -> io::Result<Vec<u8>> {
        self.units
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, name.to_string()))
    }

    fn resource(&self, path: &str) -> io::Result<Vec<u8>> {
        self.resources
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, path.to_string()))
    }
}

/// Reads `<root>/<pkg>/<Name>.unit` files, and resources relative to `root`.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub const EXTENSION: &'static str = "unit";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectorySource { root: root.into() }
    }

    pub fn path_of(&self, name: &QualifiedName) -> PathBuf {
        self.root
            .join(name.internal())
            .with_extension(Self::EXTENSION)
    }
}

impl UnitSource for DirectorySource {
    fn read(&self, name: &QualifiedName) -> io::Result<Vec<u8>> {
        std::fs::read(self.path_of(name))
    }

    fn resource(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(path))
    }
}

/// The loader consulted for units that must not be rewritten.
pub trait ParentLoader: Send + Sync {
    fn delegate(&self, name: &QualifiedName) -> Result<Arc<Artifact>, LoadError>;

    fn resource(&self, _path: &str) -> Option<Vec<u8>> {
        None
    }
}

impl<P> ParentLoader for Arc<P>
where
    P: ParentLoader + ?Sized,
{
    fn delegate(&self, name: &QualifiedName) -> Result<Arc<Artifact>, LoadError> {
        (**self).delegate(name)
    }

    fn resource(&self, path: &str) -> Option<Vec<u8>> {
        (**self).resource(path)
    }
}

/// Hands out raw representations unmodified.
#[derive(Debug)]
pub struct PassthroughLoader<S> {
    source: S,
}

impl<S> PassthroughLoader<S> {
    pub fn new(source: S) -> Self {
        PassthroughLoader { source }
    }
}

impl<S> ParentLoader for PassthroughLoader<S>
where
    S: UnitSource,
{
    fn delegate(&self, name: &QualifiedName) -> Result<Arc<Artifact>, LoadError> {
        match self.source.read(name) {
            Ok(bytes) => Ok(Arc::new(Artifact::new(
                name.clone(),
                bytes,
                Origin::Delegated,
            ))),
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    warn!(unit = %name, %err, "Parent source failed.");
                }
                Err(LoadError::ClassNotFound(name.clone()))
            }
        }
    }

    fn resource(&self, path: &str) -> Option<Vec<u8>> {
        self.source.resource(path).ok()
    }
}
