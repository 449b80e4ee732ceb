//! Building the parser tree.
//!
//! Every nested record contributes a [`ParserSpec`] and every tagged-union
//! field a [`SubparserSpec`]. Nested records do not open a new parsing
//! context - their arguments flatten into the enclosing parser - while
//! subcommands do. Trees are built bottom-up and never mutated afterwards,
//! except for the required-ness fix-up that cascading applies before the
//! build returns.

use indexmap::IndexMap;
use tracing::warn;

use crate::arguments::{ArgumentDefinition, LoweredArgument};
use crate::error::SpecError;
use crate::fields::{resolve_fields, FieldDefinition};
use crate::markers::{Marker, MarkerSet};
use crate::names::{delimited_from_camel_case, prefixed_subcommand_name, DUMMY_FIELD};
use crate::normalize::{normalize, NormalizedType};
use crate::registry::{Registry, StructTypeInfo};
use crate::schema::{type_accepts, CallMode, ConfItem, SubcommandConf, TypeExpr};
use crate::strukt::{StructFieldSpec, StructSpec};
use crate::value::{FieldDefault, Value};

/// Nesting bound; a type that reappears past this depth is treated as a
/// recursive schema and rejected.
const MAX_DEPTH: usize = 128;

/// One argument slot: the definition feeding instantiation plus its lowered
/// form feeding the driver and help.
#[derive(Debug, Clone)]
pub struct Arg {
    pub def: ArgumentDefinition,
    pub lowered: LoweredArgument,
}

/// A nested record: parsed in the enclosing context, instantiated as one
/// constructor argument of the parent.
#[derive(Debug, Clone)]
pub struct ChildParser {
    /// Whole-instance default used when none of the group's arguments were
    /// supplied on the command line.
    pub group_default: Option<Value>,
    /// Omit the field from the parent call when nothing was supplied.
    pub exclude_unset: bool,
    pub spec: ParserSpec,
}

/// A tagged-union choice, selected by a bare token.
#[derive(Debug, Clone)]
pub struct SubparserSpec {
    /// Destination key recording which option was chosen.
    pub dest: String,
    pub extern_prefix: String,
    pub options: IndexMap<String, ParserSpec>,
    pub default_name: Option<String>,
    pub default_instance: Option<Value>,
    pub required: bool,
}

/// One node of the parser tree.
#[derive(Debug, Clone)]
pub struct ParserSpec {
    pub constructor: StructSpec,
    pub description: Option<String>,
    pub args: Vec<Arg>,
    pub children: IndexMap<String, ChildParser>,
    pub subparsers: IndexMap<String, SubparserSpec>,
    pub markers: MarkerSet,
    pub intern_prefix: String,
    pub extern_prefix: String,
    /// True when this node's arguments are deferred to its leaf subparsers.
    pub cascaded: bool,
}

impl ParserSpec {
    /// Arguments parsed at this node's command line level: its own plus its
    /// nested records', subparsers excluded.
    pub(crate) fn collect_args(&self) -> Vec<&Arg> {
        let mut out: Vec<&Arg> = self.args.iter().collect();
        for child in self.children.values() {
            out.extend(child.spec.collect_args());
        }
        out
    }

    /// True when anything below this node (subparsers excluded from the walk
    /// only by their own required flags) must be supplied.
    pub(crate) fn has_required_args(&self) -> bool {
        self.args.iter().any(|arg| arg.lowered.required)
            || self.subparsers.values().any(|sub| sub.required)
            || self
                .children
                .values()
                .any(|child| child.spec.has_required_args())
    }

    /// All subcommand names reachable at this node's level.
    pub(crate) fn subcommand_names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for sub in self.subparsers.values() {
            out.extend(sub.options.keys().map(String::as_str));
        }
        for child in self.children.values() {
            out.extend(child.spec.subcommand_names());
        }
        out
    }

    /// Subparser groups at this level, nested records included.
    pub(crate) fn subparser_groups(&self) -> Vec<&SubparserSpec> {
        let mut out: Vec<&SubparserSpec> = self.subparsers.values().collect();
        for child in self.children.values() {
            out.extend(child.spec.subparser_groups());
        }
        out
    }

}

pub(crate) struct ParserBuilder<'r> {
    registry: &'r Registry,
    depth: usize,
    ancestors: Vec<String>,
}

impl<'r> ParserBuilder<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        ParserBuilder {
            registry,
            depth: 0,
            ancestors: Vec::new(),
        }
    }

    /// Build the root parser for a schema.
    pub(crate) fn build_root(
        &mut self,
        ty: &TypeExpr,
        config: MarkerSet,
        default: &FieldDefault,
        description: Option<String>,
    ) -> Result<ParserSpec, SpecError> {
        let norm = normalize(ty, config);
        let info = StructTypeInfo {
            norm: norm.clone(),
            default: default.clone(),
            path: String::new(),
        };
        let mut parser = match self.registry.get_struct_spec(&info) {
            Some(spec) => self.build_parser(spec, &norm, default, "", "", "", description)?,
            // a non-struct root rides in a synthetic single-field record
            None => {
                let field = StructFieldSpec {
                    name: DUMMY_FIELD.to_string(),
                    ty: ty.clone(),
                    default: default.clone(),
                    help: None,
                    call_name: None,
                    mode: CallMode::Positional,
                };
                let spec = StructSpec::new("", None, vec![field], |args| {
                    args.positional
                        .into_iter()
                        .next()
                        .ok_or_else(|| "no value was produced".to_string())
                });
                let wrapper_norm = normalize(&TypeExpr::Any, config);
                self.build_parser(
                    spec,
                    &wrapper_norm,
                    &FieldDefault::MissingNonprop,
                    "",
                    "",
                    "",
                    description,
                )?
            }
        };
        apply_cascade_requiredness(&mut parser);
        Ok(parser)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_parser(
        &mut self,
        struct_spec: StructSpec,
        norm: &NormalizedType,
        default: &FieldDefault,
        intern_prefix: &str,
        extern_prefix: &str,
        subcommand_prefix: &str,
        description: Option<String>,
    ) -> Result<ParserSpec, SpecError> {
        self.depth += 1;
        // shallow revisits are allowed; a reappearing type past the depth
        // bound is a recursive schema
        if self.depth > MAX_DEPTH && self.ancestors.contains(&struct_spec.name) {
            self.depth -= 1;
            return Err(SpecError::NestingTooDeep(struct_spec.name.clone()));
        }
        if self.depth > MAX_DEPTH * 2 {
            self.depth -= 1;
            return Err(SpecError::NestingTooDeep(struct_spec.name.clone()));
        }
        self.ancestors.push(struct_spec.name.clone());

        let result = self.build_parser_inner(
            &struct_spec,
            norm,
            default,
            intern_prefix,
            extern_prefix,
            subcommand_prefix,
            description,
        );

        self.ancestors.pop();
        self.depth -= 1;
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn build_parser_inner(
        &mut self,
        struct_spec: &StructSpec,
        norm: &NormalizedType,
        default: &FieldDefault,
        intern_prefix: &str,
        extern_prefix: &str,
        subcommand_prefix: &str,
        description: Option<String>,
    ) -> Result<ParserSpec, SpecError> {
        let fields = resolve_fields(struct_spec, norm, default, intern_prefix)?;

        let mut parser = ParserSpec {
            constructor: struct_spec.clone(),
            description: description.or_else(|| struct_spec.doc.clone()),
            args: Vec::new(),
            children: IndexMap::new(),
            subparsers: IndexMap::new(),
            markers: norm.markers,
            intern_prefix: intern_prefix.to_string(),
            extern_prefix: extern_prefix.to_string(),
            cascaded: false,
        };

        for field in fields {
            let field_path = join_path(intern_prefix, &field.intern_name);

            if let Some(members) = union_of_structs(self.registry, &field) {
                // AvoidSubcommands with a concrete default collapses the
                // union onto the matched branch
                if field.norm.has(Marker::AvoidSubcommands) {
                    if let FieldDefault::Value(value) = &field.default {
                        let matched =
                            self.match_subcommand_default(&field, &members, value, &field_path)?;
                        let member = &members[matched];
                        self.add_child_struct(
                            &mut parser,
                            &field,
                            member.norm.clone(),
                            intern_prefix,
                            extern_prefix,
                            subcommand_prefix,
                        )?;
                        continue;
                    }
                }
                let sub = self.build_subparser(
                    &field,
                    members,
                    intern_prefix,
                    extern_prefix,
                    &field_path,
                )?;
                parser.subparsers.insert(field.intern_name.clone(), sub);
                continue;
            }

            let struct_info = StructTypeInfo {
                norm: field.norm.clone(),
                default: field.default.clone(),
                path: field_path.clone(),
            };
            if let Some(child_spec) = self.registry.get_struct_spec(&struct_info) {
                self.add_child(
                    &mut parser,
                    &field,
                    child_spec,
                    intern_prefix,
                    extern_prefix,
                    subcommand_prefix,
                )?;
                continue;
            }

            let def = ArgumentDefinition {
                field,
                intern_prefix: intern_prefix.to_string(),
                extern_prefix: extern_prefix.to_string(),
                subcommand_prefix: subcommand_prefix.to_string(),
            };
            let lowered = def.lower(self.registry)?;
            parser.args.push(Arg { def, lowered });
        }

        parser.cascaded =
            parser.markers.contains(Marker::CascadeSubcommandArgs) && !parser.subparsers.is_empty();
        Ok(parser)
    }

    /// Re-resolve a field as a plain nested record.
    fn add_child_struct(
        &mut self,
        parser: &mut ParserSpec,
        field: &FieldDefinition,
        member_norm: NormalizedType,
        intern_prefix: &str,
        extern_prefix: &str,
        subcommand_prefix: &str,
    ) -> Result<(), SpecError> {
        let field_path = join_path(intern_prefix, &field.intern_name);
        let info = StructTypeInfo {
            norm: member_norm.clone(),
            default: field.default.clone(),
            path: field_path.clone(),
        };
        let spec = self
            .registry
            .get_struct_spec(&info)
            .ok_or_else(|| SpecError::UnsupportedTypeAnnotation(member_norm.ty.describe()))?;
        let mut narrowed = field.clone();
        narrowed.norm = member_norm;
        self.add_child(
            parser,
            &narrowed,
            spec,
            intern_prefix,
            extern_prefix,
            subcommand_prefix,
        )
    }

    fn add_child(
        &mut self,
        parser: &mut ParserSpec,
        field: &FieldDefinition,
        child_spec: StructSpec,
        intern_prefix: &str,
        extern_prefix: &str,
        subcommand_prefix: &str,
    ) -> Result<(), SpecError> {
        let child_intern = join_path(intern_prefix, &field.intern_name);
        let child_extern = if field.prefix_name {
            join_path(extern_prefix, &field.extern_name)
        } else {
            extern_prefix.to_string()
        };
        let child = self.build_parser(
            child_spec,
            &field.norm,
            &field.default,
            &child_intern,
            &child_extern,
            subcommand_prefix,
            None,
        )?;
        parser.children.insert(
            field.intern_name.clone(),
            ChildParser {
                group_default: field.default.as_value().cloned(),
                exclude_unset: matches!(field.default, FieldDefault::ExcludeFromCall),
                spec: child,
            },
        );
        Ok(())
    }

    fn build_subparser(
        &mut self,
        field: &FieldDefinition,
        members: Vec<UnionMember>,
        intern_prefix: &str,
        extern_prefix: &str,
        field_path: &str,
    ) -> Result<SubparserSpec, SpecError> {
        let sub_extern = if field.prefix_name {
            join_path(extern_prefix, &field.extern_name)
        } else {
            extern_prefix.to_string()
        };
        let omit_prefixes = field.norm.has(Marker::OmitSubcommandPrefixes);

        // names first; the default has to be matched before parsers build so
        // the winning branch receives it
        let mut named: Vec<(String, UnionMember)> = Vec::new();
        for member in members {
            let use_prefix = member.conf.as_ref().map_or(true, |c| c.prefix_name) && !omit_prefixes;
            let name = prefixed_subcommand_name(&sub_extern, &member.name, use_prefix);
            named.push((name, member));
        }

        let mut default_name = None;
        let mut default_instance = None;
        let mut required = true;
        if let FieldDefault::Value(value) = &field.default {
            let members_only: Vec<UnionMember> =
                named.iter().map(|(_, m)| m.clone()).collect();
            let matched =
                self.match_subcommand_default(field, &members_only, value, field_path)?;
            default_name = Some(named[matched].0.clone());
            default_instance = Some(value.clone());
            required = false;
        }

        let mut options: IndexMap<String, ParserSpec> = IndexMap::new();
        for (name, member) in named {
            let is_default = default_name.as_deref() == Some(name.as_str());
            let member_default = if is_default {
                field.default.clone()
            } else if let Some(conf_default) = member.conf.as_ref().and_then(|c| c.default.clone())
            {
                FieldDefault::Value(conf_default)
            } else {
                FieldDefault::MissingNonprop
            };
            let description = member
                .conf
                .as_ref()
                .and_then(|c| c.description.clone());
            let option = match member.struct_spec {
                Some(spec) => self.build_parser(
                    spec,
                    &member.norm,
                    &member_default,
                    field_path,
                    &sub_extern,
                    &sub_extern,
                    description,
                )?,
                // the unit branch of an optional union parses no arguments
                None => ParserSpec {
                    constructor: none_constructor(),
                    description,
                    args: Vec::new(),
                    children: IndexMap::new(),
                    subparsers: IndexMap::new(),
                    markers: member.norm.markers,
                    intern_prefix: field_path.to_string(),
                    extern_prefix: sub_extern.clone(),
                    cascaded: false,
                },
            };
            if options.contains_key(&name) {
                warn!(name = %name, "duplicate subcommand name; the last registration wins");
            }
            options.insert(name, option);
        }

        // a default cannot paper over required holes in its branch
        if let Some(name) = &default_name {
            let leaves_required = options
                .get(name)
                .is_some_and(|opt| opt.has_required_args());
            if leaves_required {
                default_name = None;
                default_instance = None;
                required = true;
            }
        }

        Ok(SubparserSpec {
            dest: field_path.to_string(),
            extern_prefix: sub_extern,
            options,
            default_name,
            default_instance,
            required,
        })
    }

    /// Match a concrete default to one of the union branches.
    fn match_subcommand_default(
        &mut self,
        field: &FieldDefinition,
        members: &[UnionMember],
        value: &Value,
        field_path: &str,
    ) -> Result<usize, SpecError> {
        // a branch that registered this exact default wins outright
        for (ix, member) in members.iter().enumerate() {
            if member.conf.as_ref().and_then(|c| c.default.as_ref()) == Some(value) {
                return Ok(ix);
            }
        }

        // otherwise score structurally compatible branches by matching
        // argument names, then matching argument values
        let mut best: Option<(usize, (usize, usize))> = None;
        let mut tied = false;
        for (ix, member) in members.iter().enumerate() {
            if !type_accepts(&member.norm.ty, value) {
                continue;
            }
            let score = match (member.struct_spec.as_ref(), value.as_struct()) {
                (Some(spec), Some(sv)) => {
                    let names = sv
                        .fields
                        .iter()
                        .filter(|(n, _)| spec.fields.iter().any(|f| &f.name == n))
                        .count();
                    let values = sv
                        .fields
                        .iter()
                        .filter(|(n, v)| {
                            spec.fields
                                .iter()
                                .any(|f| &f.name == n && f.default.as_value() == Some(v))
                        })
                        .count();
                    (names, values)
                }
                _ => (0, 0),
            };
            match &best {
                Some((_, best_score)) if *best_score == score => tied = true,
                Some((_, best_score)) if *best_score > score => {}
                _ => {
                    best = Some((ix, score));
                    tied = false;
                }
            }
        }

        match best {
            Some((ix, _)) => {
                if tied {
                    warn!(
                        field = field_path,
                        "ambiguous subcommand default match; keeping the first candidate"
                    );
                }
                Ok(ix)
            }
            None => Err(SpecError::UnmatchedSubcommandDefault {
                field: field_path.to_string(),
                choices: members
                    .iter()
                    .map(|m| m.name.clone())
                    .collect::<Vec<_>>()
                    .join(","),
            }),
        }
    }
}

/// One branch of a union that resolves to subcommands.
#[derive(Clone)]
struct UnionMember {
    name: String,
    norm: NormalizedType,
    conf: Option<SubcommandConf>,
    struct_spec: Option<StructSpec>,
}

/// When a union field should become a subparser, its members; `None` when
/// the union parses as a primitive.
fn union_of_structs(registry: &Registry, field: &FieldDefinition) -> Option<Vec<UnionMember>> {
    let options = match &field.norm.ty {
        TypeExpr::Union(options) => options.clone(),
        _ => return None,
    };

    let mut members = Vec::with_capacity(options.len());
    let mut any_struct = false;
    for option in &options {
        let norm = field.norm.normalize_child(option);
        let conf = norm.conf.iter().rev().find_map(|item| match item {
            ConfItem::Subcommand(sc) => Some(sc.clone()),
            _ => None,
        });
        let struct_spec = registry.get_struct_spec(&StructTypeInfo {
            norm: norm.clone(),
            default: FieldDefault::MissingNonprop,
            path: field.intern_name.clone(),
        });
        if struct_spec.is_some() {
            any_struct = true;
        }
        let name = match conf.as_ref().and_then(|c| c.name.clone()) {
            Some(name) => name,
            None => subcommand_name_for(&norm),
        };
        members.push(UnionMember {
            name,
            norm,
            conf,
            struct_spec,
        });
    }

    if !any_struct {
        return None;
    }
    // unit branches ride along; anything else must decompose
    if members
        .iter()
        .any(|m| m.struct_spec.is_none() && !matches!(m.norm.ty, TypeExpr::NoneType))
    {
        return None;
    }
    Some(members)
}

/// Auto-generated subcommand name: configuration, alias breadcrumb, then the
/// type name, camel-case converted per the active delimiter.
fn subcommand_name_for(norm: &NormalizedType) -> String {
    if let Some(breadcrumb) = &norm.alias_breadcrumb {
        return delimited_from_camel_case(breadcrumb);
    }
    match &norm.ty {
        TypeExpr::NoneType => "None".to_string(),
        TypeExpr::Struct(schema) => delimited_from_camel_case(&schema.name),
        other => delimited_from_camel_case(&other.describe()),
    }
}

fn none_constructor() -> StructSpec {
    StructSpec::new("None", None, Vec::new(), |_args| Ok(Value::None))
}

fn join_path(prefix: &str, name: &str) -> String {
    if name == DUMMY_FIELD {
        prefix.to_string()
    } else if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Cascaded nodes with required arguments force every subparser below them
/// to be required; a default that would leave required holes is dropped.
fn apply_cascade_requiredness(parser: &mut ParserSpec) {
    let make_required = parser.cascaded
        && parser
            .collect_args()
            .iter()
            .any(|arg| arg.lowered.required);
    if make_required {
        force_required(parser);
    }
    for sub in parser.subparsers.values_mut() {
        for option in sub.options.values_mut() {
            apply_cascade_requiredness(option);
        }
    }
    for child in parser.children.values_mut() {
        apply_cascade_requiredness(&mut child.spec);
    }
}

fn force_required(parser: &mut ParserSpec) {
    for sub in parser.subparsers.values_mut() {
        sub.required = true;
        sub.default_name = None;
        sub.default_instance = None;
        for option in sub.options.values_mut() {
            force_required(option);
        }
    }
    for child in parser.children.values_mut() {
        force_required(&mut child.spec);
    }
}
