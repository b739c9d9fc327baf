use crate::error::{Error, Result};
use crate::pool::ConstantPool;
use crate::reader::{safe_count, AbcReader};

/// Method signature entry. Parameter types, optionals and parameter names
/// are consumed but not retained; only what the decompiler needs survives.
#[derive(Debug, Clone, Default)]
pub struct MethodInfo {
    pub name: u32,
    pub param_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct MethodBody {
    /// Back-reference into the method-info table.
    pub method: u32,
    pub max_stack: u32,
    pub local_count: u32,
    /// Raw bytecode, opaque at this layer.
    pub code: Vec<u8>,
}

/// Trait payload, one variant per kind nibble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraitData {
    Slot {
        slot_id: u32,
        type_name: u32,
        value_index: u32,
        /// Present on the wire only when `value_index` is non-zero.
        value_kind: Option<u8>,
    },
    Const {
        slot_id: u32,
        type_name: u32,
        value_index: u32,
        value_kind: Option<u8>,
    },
    Method { disp_id: u32, method: u32 },
    Getter { disp_id: u32, method: u32 },
    Setter { disp_id: u32, method: u32 },
    Class { slot_id: u32, class: u32 },
    Function { slot_id: u32, function: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trait {
    /// Multiname index of the trait's name.
    pub name: u32,
    pub data: TraitData,
}

impl Trait {
    /// Method-info index for Method/Getter/Setter traits.
    pub fn method_index(&self) -> Option<u32> {
        match self.data {
            TraitData::Method { method, .. }
            | TraitData::Getter { method, .. }
            | TraitData::Setter { method, .. } => Some(method),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    pub init: u32,
    pub traits: Vec<Trait>,
}

#[derive(Debug, Clone, Default)]
pub struct InstanceInfo {
    pub name: u32,
    pub super_name: u32,
    pub init: u32,
    pub traits: Vec<Trait>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    pub init: u32,
    pub traits: Vec<Trait>,
}

/// Paired instance + static halves of a class definition.
#[derive(Debug, Clone, Default)]
pub struct ClassDef {
    pub instance: InstanceInfo,
    pub statics: ClassInfo,
}

#[derive(Debug, Default)]
pub struct Abc {
    pub minor_version: u16,
    pub major_version: u16,
    pub pool: ConstantPool,
    pub methods: Vec<MethodInfo>,
    pub classes: Vec<ClassDef>,
    pub scripts: Vec<Script>,
    pub bodies: Vec<MethodBody>,
}

impl Abc {
    /// Parse an ABC image in its fixed table order: version, constant pool,
    /// method infos, metadata (skipped), classes, scripts, method bodies.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = AbcReader::new(data);
        let mut abc = Self {
            minor_version: r.read_u16(),
            major_version: r.read_u16(),
            ..Self::default()
        };

        abc.pool = ConstantPool::parse(&mut r)?;
        abc.methods = read_methods(&mut r)?;
        skip_metadata(&mut r)?;
        abc.classes = read_classes(&mut r)?;
        abc.scripts = read_scripts(&mut r)?;
        abc.bodies = read_bodies(&mut r)?;
        Ok(abc)
    }

    /// Body for a method-info index; `None` for native methods.
    pub fn body_for_method(&self, method: u32) -> Option<&MethodBody> {
        self.bodies.iter().find(|b| b.method == method)
    }
}

/// Strip a leading doABC tag header: a u32 flag word equal to 1 followed by
/// a null-terminated name. Anything else rewinds to byte 0.
pub fn strip_do_abc_header(data: &[u8]) -> &[u8] {
    if data.len() < 4 || u32::from_le_bytes([data[0], data[1], data[2], data[3]]) != 1 {
        return data;
    }
    let mut pos = 4;
    while pos < data.len() && data[pos] != 0 {
        pos += 1;
    }
    if pos < data.len() {
        pos += 1;
    }
    &data[pos..]
}

fn read_methods(r: &mut AbcReader) -> Result<Vec<MethodInfo>> {
    let count = safe_count(r.read_u30()?, "method infos")?;
    let mut methods = Vec::with_capacity(count);
    for _ in 0..count {
        let param_count = r.read_u30()?;
        r.read_u30()?; // return type
        for _ in 0..safe_count(param_count, "method parameters")? {
            r.read_u30()?;
        }
        let name = r.read_u30()?;
        let flags = r.read_u8();

        if flags & 0x08 != 0 {
            // HAS_OPTIONAL
            let optional = safe_count(r.read_u30()?, "optional parameters")?;
            for _ in 0..optional {
                r.read_u30()?;
                r.read_u8();
            }
        }
        if flags & 0x80 != 0 {
            // HAS_PARAM_NAMES
            for _ in 0..safe_count(param_count, "parameter names")? {
                r.read_u30()?;
            }
        }
        methods.push(MethodInfo { name, param_count });
    }
    Ok(methods)
}

fn skip_metadata(r: &mut AbcReader) -> Result<()> {
    let count = safe_count(r.read_u30()?, "metadata")?;
    for _ in 0..count {
        r.read_u30()?; // name
        let pairs = safe_count(r.read_u30()?, "metadata items")?;
        for _ in 0..pairs * 2 {
            r.read_u30()?;
        }
    }
    Ok(())
}

fn read_classes(r: &mut AbcReader) -> Result<Vec<ClassDef>> {
    let count = safe_count(r.read_u30()?, "classes")?;
    let mut classes = vec![ClassDef::default(); count];

    for def in classes.iter_mut() {
        let inst = &mut def.instance;
        inst.name = r.read_u30()?;
        inst.super_name = r.read_u30()?;
        let flags = r.read_u8();
        if flags & 0x08 != 0 {
            r.read_u30()?; // protected namespace
        }
        if flags & 0x10 != 0 {
            r.read_u30()?;
        }
        if flags & 0x20 != 0 {
            r.read_u30()?;
        }
        let interfaces = safe_count(r.read_u30()?, "interfaces")?;
        for _ in 0..interfaces {
            r.read_u30()?;
        }
        inst.init = r.read_u30()?;
        inst.traits = read_traits(r)?;
    }

    for def in classes.iter_mut() {
        def.statics.init = r.read_u30()?;
        def.statics.traits = read_traits(r)?;
    }
    Ok(classes)
}

fn read_scripts(r: &mut AbcReader) -> Result<Vec<Script>> {
    let count = safe_count(r.read_u30()?, "scripts")?;
    let mut scripts = Vec::with_capacity(count);
    for _ in 0..count {
        scripts.push(Script {
            init: r.read_u30()?,
            traits: read_traits(r)?,
        });
    }
    Ok(scripts)
}

fn read_bodies(r: &mut AbcReader) -> Result<Vec<MethodBody>> {
    let count = safe_count(r.read_u30()?, "method bodies")?;
    let mut bodies = Vec::with_capacity(count);
    for _ in 0..count {
        let method = r.read_u30()?;
        let max_stack = r.read_u30()?;
        let local_count = r.read_u30()?;
        r.read_u30()?; // init scope depth
        r.read_u30()?; // max scope depth
        let code_len = safe_count(r.read_u30()?, "method code")?;
        let mut code = vec![0u8; code_len];
        for byte in code.iter_mut() {
            *byte = r.read_u8();
        }
        skip_exceptions(r)?;
        read_traits(r)?; // body traits, not retained
        bodies.push(MethodBody {
            method,
            max_stack,
            local_count,
            code,
        });
    }
    Ok(bodies)
}

fn skip_exceptions(r: &mut AbcReader) -> Result<()> {
    let count = safe_count(r.read_u30()?, "exception table")?;
    for _ in 0..count {
        for _ in 0..5 {
            // from, to, target, exception type, variable name
            r.read_u30()?;
        }
    }
    Ok(())
}

fn read_traits(r: &mut AbcReader) -> Result<Vec<Trait>> {
    let count = safe_count(r.read_u30()?, "traits")?;
    let mut traits = Vec::with_capacity(count);
    for _ in 0..count {
        let name = r.read_u30()?;
        let kind = r.read_u8();
        let id = r.read_u30()?; // slot_id or disp_id

        let data = match kind & 0x0F {
            k @ (0 | 6) => {
                let type_name = r.read_u30()?;
                let value_index = r.read_u30()?;
                let value_kind = (value_index != 0).then(|| r.read_u8());
                if k == 0 {
                    TraitData::Slot {
                        slot_id: id,
                        type_name,
                        value_index,
                        value_kind,
                    }
                } else {
                    TraitData::Const {
                        slot_id: id,
                        type_name,
                        value_index,
                        value_kind,
                    }
                }
            }
            1 => TraitData::Method {
                disp_id: id,
                method: r.read_u30()?,
            },
            2 => TraitData::Getter {
                disp_id: id,
                method: r.read_u30()?,
            },
            3 => TraitData::Setter {
                disp_id: id,
                method: r.read_u30()?,
            },
            4 => TraitData::Class {
                slot_id: id,
                class: r.read_u30()?,
            },
            5 => TraitData::Function {
                slot_id: id,
                function: r.read_u30()?,
            },
            _ => return Err(Error::UnknownTraitKind { kind }),
        };

        if kind & 0x40 != 0 {
            // metadata-index list
            let metadata = safe_count(r.read_u30()?, "trait metadata")?;
            for _ in 0..metadata {
                r.read_u30()?;
            }
        }
        traits.push(Trait { name, data });
    }
    Ok(traits)
}
