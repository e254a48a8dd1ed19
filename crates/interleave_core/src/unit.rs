use std::fmt::{Display, Formatter};

/// The format version declared by a program unit's raw representation.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FormatVersion(pub u32);

impl FormatVersion {
    pub const V1_5: FormatVersion = FormatVersion(49);
    pub const V1_6: FormatVersion = FormatVersion(50);
    pub const V1_7: FormatVersion = FormatVersion(51);
    pub const V1_8: FormatVersion = FormatVersion(52);

    /// Units newer than this must carry full stack frames at every merge point.
    pub const FRAMES_REQUIRED_AFTER: FormatVersion = FormatVersion::V1_6;

    pub fn requires_frames(self) -> bool {
        self > Self::FRAMES_REQUIRED_AFTER
    }
}

impl Display for FormatVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// The mutable structural form of a program unit. Type names use the slash-separated internal
/// form.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct UnitNode {
    pub version: FormatVersion,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub super_name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub interfaces: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_interface: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub methods: Vec<MethodNode>,
}

impl UnitNode {
    pub fn new(version: FormatVersion, name: impl Into<String>) -> Self {
        UnitNode {
            version,
            name: name.into(),
            ..UnitNode::default()
        }
    }

    pub fn extends(mut self, super_name: impl Into<String>) -> Self {
        self.super_name = Some(super_name.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn interface(mut self) -> Self {
        self.is_interface = true;
        self
    }

    pub fn method(mut self, method: MethodNode) -> Self {
        self.methods.push(method);
        self
    }

    /// The declared direct supertypes: the super type first, then interfaces in order.
    pub fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.super_name
            .iter()
            .chain(self.interfaces.iter())
            .map(String::as_str)
    }

    /// Rewrites every type reference in the unit, including its own name.
    pub fn map_types(&mut self, mut f: impl FnMut(&str) -> String) {
        self.name = f(&self.name);
        if let Some(super_name) = &mut self.super_name {
            *super_name = f(super_name);
        }
        for interface in &mut self.interfaces {
            *interface = f(interface);
        }
        for method in &mut self.methods {
            for insn in &mut method.instructions {
                match insn {
                    Insn::Load(ty) => *ty = f(ty),
                    Insn::Invoke { owner, returns, .. } => {
                        *owner = f(owner);
                        if let Some(ret) = returns {
                            *ret = f(ret);
                        }
                    }
                    _ => (),
                }
            }
            for frame in &mut method.frames {
                for ty in &mut frame.stack {
                    *ty = f(ty);
                }
            }
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MethodNode {
    pub name: String,
    pub instructions: Vec<Insn>,
    /// Computed by the writer.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_stack: u16,
    /// Computed by the writer for units that require frames.
    #[cfg_attr(feature = "serde", serde(default))]
    pub frames: Vec<Frame>,
}

impl MethodNode {
    pub fn new(name: impl Into<String>, instructions: Vec<Insn>) -> Self {
        MethodNode {
            name: name.into(),
            instructions,
            ..MethodNode::default()
        }
    }
}

/// An instruction of the operand-stack machine.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Insn {
    /// Pushes a value of the given type.
    Load(String),
    Pop,
    /// Pops `args` values and pushes a value of type `returns` if present.
    Invoke {
        owner: String,
        name: String,
        args: u8,
        returns: Option<String>,
    },
    /// An interception point inserted by a rewrite pass. No stack effect.
    Intercept { hook: String },
    /// A jump target, and therefore a potential merge point.
    Label(u16),
    Jump(u16),
    /// Pops a condition and either jumps or falls through.
    JumpIf(u16),
    Return,
}

impl Insn {
    /// Values popped and pushed.
    pub fn stack_effect(&self) -> (usize, usize) {
        match self {
            Insn::Load(_) => (0, 1),
            Insn::Pop => (1, 0),
            Insn::Invoke { args, returns, .. } => (*args as usize, returns.is_some() as usize),
            Insn::JumpIf(_) => (1, 0),
            Insn::Intercept { .. } | Insn::Label(_) | Insn::Jump(_) | Insn::Return => (0, 0),
        }
    }
}

/// The operand stack types at a merge label, bottom first.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Frame {
    pub label: u16,
    pub stack: Vec<String>,
}
