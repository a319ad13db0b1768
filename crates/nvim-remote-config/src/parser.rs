//! KDL configuration parser

use std::path::Path;

use nvim_remote_api::{Border, BorderChar, Coordinate, Relative, WindowConfig};

use crate::error::ConfigError;
use crate::model::*;

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl uses an older miette version, so we need to extract offset/len manually
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "layout" => {
                let (name, layout) = parse_layout(node)?;
                if config.layouts.contains_key(&name) {
                    return Err(ConfigError::Invalid {
                        message: format!("Layout '{}' is defined more than once", name),
                    });
                }
                config.layouts.insert(name, layout);
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(config)
}

/// Positional arguments of a node, skipping `key=value` properties
fn arguments(node: &kdl::KdlNode) -> impl Iterator<Item = &kdl::KdlValue> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| e.value())
}

/// Value of a `key=value` property
fn property<'a>(node: &'a kdl::KdlNode, key: &str) -> Option<&'a kdl::KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .map(|e| e.value())
}

fn invalid(context: &str, node: &kdl::KdlNode, what: &str) -> ConfigError {
    ConfigError::Invalid {
        message: format!("{}: `{}` {}", context, node.name().value(), what),
    }
}

fn string_arg<'a>(node: &'a kdl::KdlNode, context: &str) -> Result<&'a str, ConfigError> {
    arguments(node)
        .next()
        .and_then(|v| v.as_string())
        .ok_or_else(|| invalid(context, node, "expects a string"))
}

fn int_arg(node: &kdl::KdlNode, context: &str) -> Result<i64, ConfigError> {
    arguments(node)
        .next()
        .and_then(|v| v.as_i64())
        .ok_or_else(|| invalid(context, node, "expects an integer"))
}

fn bool_arg(node: &kdl::KdlNode, context: &str) -> Result<bool, ConfigError> {
    arguments(node)
        .next()
        .and_then(|v| v.as_bool())
        .ok_or_else(|| invalid(context, node, "expects true or false"))
}

fn coordinate_arg(node: &kdl::KdlNode, context: &str) -> Result<Coordinate, ConfigError> {
    let value = arguments(node)
        .next()
        .ok_or_else(|| invalid(context, node, "expects a number"))?;

    if let Some(v) = value.as_i64() {
        Ok(Coordinate::Int(v))
    } else if let Some(v) = value.as_f64() {
        Ok(Coordinate::Float(v))
    } else {
        Err(invalid(context, node, "expects a number"))
    }
}

fn size_arg(node: &kdl::KdlNode, context: &str) -> Result<u32, ConfigError> {
    let value = int_arg(node, context)?;
    u32::try_from(value).map_err(|_| invalid(context, node, "must not be negative"))
}

/// Parse an enum spelled as a string, e.g. `anchor "NW"`
fn parsed_arg<T>(node: &kdl::KdlNode, context: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = String>,
{
    string_arg(node, context)?
        .parse()
        .map_err(|e: String| ConfigError::Invalid {
            message: format!("{}: {}", context, e),
        })
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "log-level" => {
                    if let Some(val) = arguments(child).next().and_then(|v| v.as_string()) {
                        global.log_level = val
                            .parse()
                            .map_err(|e| ConfigError::Invalid { message: e })?;
                    }
                }
                "socket" => {
                    if let Some(val) = arguments(child).next().and_then(|v| v.as_string()) {
                        global.socket = Some(shellexpand::tilde(val).into_owned().into());
                    }
                }
                "connect-retries" => {
                    let retries = int_arg(child, "global")?;
                    global.connect_retries = u32::try_from(retries)
                        .map_err(|_| invalid("global", child, "must not be negative"))?;
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_layout(node: &kdl::KdlNode) -> Result<(String, WindowConfig), ConfigError> {
    let name = arguments(node)
        .next()
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
        .ok_or_else(|| ConfigError::MissingField {
            field: "layout name (e.g., `layout \"popup\" { ... }`)".to_string(),
        })?;

    let context = format!("Layout '{}'", name);
    let ctx = context.as_str();
    let mut layout = WindowConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "relative" => {
                    let relative = Relative::from(string_arg(child, ctx)?.to_string());
                    if let Relative::Other(value) = &relative {
                        tracing::warn!("{}: relative \"{}\" is passed to nvim as is", ctx, value);
                    }
                    layout.relative = Some(relative);
                }
                "focusable" => layout.focusable = Some(bool_arg(child, ctx)?),
                "external" => layout.external = Some(bool_arg(child, ctx)?),
                "win" => layout.win = Some(int_arg(child, ctx)?),
                "anchor" => layout.anchor = Some(parsed_arg(child, ctx)?),
                "width" => layout.width = Some(size_arg(child, ctx)?),
                "height" => layout.height = Some(size_arg(child, ctx)?),
                "bufpos" => {
                    let mut values = arguments(child).map(|v| v.as_i64());
                    match (values.next(), values.next(), values.next()) {
                        (Some(Some(line)), Some(Some(column)), None) => {
                            layout.bufpos = Some((line, column));
                        }
                        _ => return Err(invalid(ctx, child, "expects two integers")),
                    }
                }
                "row" => layout.row = Some(coordinate_arg(child, ctx)?),
                "col" => layout.col = Some(coordinate_arg(child, ctx)?),
                "zindex" => layout.zindex = Some(int_arg(child, ctx)?),
                "style" => layout.style = Some(parsed_arg(child, ctx)?),
                "border" => layout.border = Some(parse_border(child, ctx)?),
                "noautocmd" => layout.noautocmd = Some(bool_arg(child, ctx)?),
                name => {
                    tracing::warn!("Unknown layout option in {}: {}", ctx, name);
                }
            }
        }
    }

    layout
        .validate()
        .map_err(|source| ConfigError::InvalidLayout {
            layout: name.clone(),
            source,
        })?;

    Ok((name, layout))
}

/// Inline cell: `"c"` or `"c:HlGroup"`
fn inline_cell(cell: &str) -> BorderChar {
    match cell.split_once(':') {
        Some((text, hl)) if !text.is_empty() && !hl.is_empty() => BorderChar::from((text, hl)),
        _ => BorderChar::from(cell),
    }
}

/// `border "rounded"`, `border "a" "b" ...`, or a block of `cell` nodes
fn parse_border(node: &kdl::KdlNode, context: &str) -> Result<Border, ConfigError> {
    if let Some(children) = node.children() {
        let mut cells = Vec::new();
        for cell in children.nodes() {
            if cell.name().value() != "cell" {
                tracing::warn!("Unknown border option in {}: {}", context, cell.name().value());
                continue;
            }
            let text = string_arg(cell, context)?.to_string();
            let highlight = property(cell, "hl").and_then(|v| v.as_string());
            cells.push(match highlight {
                Some(hl) => BorderChar::CharWithHighlight(text, hl.to_string()),
                None => BorderChar::Char(text),
            });
        }
        return Ok(Border::Manual(cells));
    }

    let values = arguments(node)
        .map(|v| v.as_string())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| invalid(context, node, "entries must be strings"))?;

    match values.as_slice() {
        [] => Err(invalid(context, node, "expects a preset or border cells")),
        [preset] => preset
            .parse()
            .map(Border::Preset)
            .map_err(|e: String| ConfigError::Invalid {
                message: format!("{}: {}", context, e),
            }),
        cells => Ok(Border::Manual(cells.iter().map(|c| inline_cell(c)).collect())),
    }
}
