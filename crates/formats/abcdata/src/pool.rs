use crate::error::{Error, Result};
use crate::reader::{safe_count, AbcReader};

/// Namespace entry: kind byte plus a string-pool index.
#[derive(Debug, Clone, Copy, Default)]
pub struct Namespace {
    pub kind: u8,
    pub name: u32,
}

/// A late-bound name. The attribute forms (QNameA etc.) parse identically to
/// their base forms and are not distinguished after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Multiname {
    /// 0x07 / 0x0D — namespace + name known at decode time.
    QName { ns: u32, name: u32 },
    /// 0x0F / 0x10 — name known, namespace from the runtime stack.
    RtQName { name: u32 },
    /// 0x11 / 0x12 — both parts from the runtime stack.
    RtQNameL,
    /// 0x09 / 0x0E — name + namespace set.
    Multiname { name: u32, ns_set: u32 },
    /// 0x1B / 0x1C — name from the runtime stack, namespace set known.
    MultinameL { ns_set: u32 },
    /// 0x1D — parameterised type name.
    TypeName { name: u32, parameters: Vec<u32> },
}

/// Parallel constant tables. Index 0 of every table is reserved ("any");
/// meaningful entries start at 1, and the reserved slot holds a default.
#[derive(Debug, Default)]
pub struct ConstantPool {
    pub ints: Vec<i32>,
    pub uints: Vec<u32>,
    pub doubles: Vec<f64>,
    pub strings: Vec<String>,
    pub namespaces: Vec<Namespace>,
    pub namespace_sets: Vec<Vec<u32>>,
    pub multinames: Vec<Multiname>,
}

impl ConstantPool {
    /// Parse the seven tables in wire order:
    /// int, uint, double, string, namespace, namespace-set, multiname.
    pub fn parse(r: &mut AbcReader) -> Result<Self> {
        let mut pool = Self::default();

        let count = safe_count(r.read_u30()?, "integer pool")?;
        pool.ints = vec![0; count];
        for i in 1..count {
            pool.ints[i] = r.read_u30()? as i32;
        }

        let count = safe_count(r.read_u30()?, "uint pool")?;
        pool.uints = vec![0; count];
        for i in 1..count {
            pool.uints[i] = r.read_u30()?;
        }

        let count = safe_count(r.read_u30()?, "double pool")?;
        pool.doubles = vec![0.0; count];
        for i in 1..count {
            pool.doubles[i] = r.read_f64();
        }

        let count = safe_count(r.read_u30()?, "string pool")?;
        pool.strings = vec![String::new(); count];
        for i in 1..count {
            pool.strings[i] = r.read_string()?;
        }

        let count = safe_count(r.read_u30()?, "namespace pool")?;
        pool.namespaces = vec![Namespace::default(); count];
        for i in 1..count {
            pool.namespaces[i] = Namespace {
                kind: r.read_u8(),
                name: r.read_u30()?,
            };
        }

        let count = safe_count(r.read_u30()?, "namespace-set pool")?;
        pool.namespace_sets = vec![Vec::new(); count];
        for i in 1..count {
            let entries = safe_count(r.read_u30()?, "namespace set")?;
            let mut set = Vec::with_capacity(entries);
            for _ in 0..entries {
                set.push(r.read_u30()?);
            }
            pool.namespace_sets[i] = set;
        }

        let count = safe_count(r.read_u30()?, "multiname pool")?;
        pool.multinames = vec![Multiname::RtQNameL; count];
        for i in 1..count {
            pool.multinames[i] = read_multiname(r)?;
        }

        Ok(pool)
    }

    /// String by pool index; empty for index 0 and out-of-range indices.
    pub fn string(&self, idx: u32) -> &str {
        self.strings
            .get(idx as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn int(&self, idx: u32) -> i32 {
        self.ints.get(idx as usize).copied().unwrap_or(0)
    }

    pub fn uint(&self, idx: u32) -> u32 {
        self.uints.get(idx as usize).copied().unwrap_or(0)
    }

    pub fn double(&self, idx: u32) -> f64 {
        self.doubles.get(idx as usize).copied().unwrap_or(0.0)
    }

    pub fn multiname(&self, idx: u32) -> Option<&Multiname> {
        if idx == 0 {
            return None;
        }
        self.multinames.get(idx as usize)
    }

    /// Bare name of a multiname. Unresolvable multiname indices yield
    /// `"unknown"`; a bad inner string index yields `name<idx>`.
    pub fn multiname_name(&self, idx: u32) -> String {
        let Some(mn) = self.multiname(idx) else {
            return "unknown".to_string();
        };
        let name_idx = match mn {
            Multiname::QName { name, .. }
            | Multiname::RtQName { name }
            | Multiname::Multiname { name, .. }
            | Multiname::TypeName { name, .. } => *name,
            Multiname::RtQNameL | Multiname::MultinameL { .. } => {
                return "unknown".to_string();
            }
        };
        if (name_idx as usize) < self.strings.len() {
            self.strings[name_idx as usize].clone()
        } else {
            format!("name{idx}")
        }
    }

    /// Dotted package string of a QName's namespace; empty when the
    /// namespace is absent or unresolvable.
    pub fn multiname_package(&self, idx: u32) -> &str {
        let Some(Multiname::QName { ns, .. }) = self.multiname(idx) else {
            return "";
        };
        let Some(namespace) = self.namespaces.get(*ns as usize).filter(|_| *ns != 0) else {
            return "";
        };
        self.string(namespace.name)
    }
}

fn read_multiname(r: &mut AbcReader) -> Result<Multiname> {
    let kind = r.read_u8();
    match kind {
        0x07 | 0x0D => Ok(Multiname::QName {
            ns: r.read_u30()?,
            name: r.read_u30()?,
        }),
        0x0F | 0x10 => Ok(Multiname::RtQName {
            name: r.read_u30()?,
        }),
        0x11 | 0x12 => Ok(Multiname::RtQNameL),
        0x09 | 0x0E => Ok(Multiname::Multiname {
            name: r.read_u30()?,
            ns_set: r.read_u30()?,
        }),
        0x1B | 0x1C => Ok(Multiname::MultinameL {
            ns_set: r.read_u30()?,
        }),
        0x1D => {
            let name = r.read_u30()?;
            let count = safe_count(r.read_u30()?, "type parameters")?;
            let mut parameters = Vec::with_capacity(count);
            for _ in 0..count {
                parameters.push(r.read_u30()?);
            }
            Ok(Multiname::TypeName { name, parameters })
        }
        _ => Err(Error::UnknownMultinameKind { kind }),
    }
}
