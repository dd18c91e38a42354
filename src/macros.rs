//! Macro preprocessor
//!
//! A pure text-to-text pass run before any parsing. `MACRO` definition
//! lines are collected into a table and removed, `#` comment lines are
//! stripped, and every remaining `^key` invocation is expanded by
//! replacing its whole containing line. Expansion repeats until no
//! marker remains or a full pass makes zero substitutions, so an
//! unresolvable marker cannot loop forever.

use crate::config;
use crate::error::{AmtaError, ErrorKind, Result};

/// Identifier characters: the run after `^`, `$` or `@`.
pub(crate) fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A single macro definition.
///
/// Declared as `MACRO key(a,b)[multi] => [repMulti]expansion{inplace}`.
/// The multi template expands once per bracketed call argument with the
/// reserved `%..%` token replaced by the element index; the in-place
/// template is spliced back into the original line in place of the
/// invocation, which lets macros act as sub-expressions.
#[derive(Debug, Clone)]
pub struct Macro {
    pub key: String,
    def_args: Vec<String>,
    def_multi: Option<String>,
    rep_multi: Option<String>,
    expansion: String,
    inplace: Option<String>,
}

impl Macro {
    /// Parse a trimmed `MACRO ...` line.
    pub fn parse(line: &str) -> Result<Self> {
        let malformed = || AmtaError::new(ErrorKind::MalformedMacro(line.to_string()));
        let rest = line.strip_prefix("MACRO ").ok_or_else(malformed)?;
        let split = rest.find("=>").ok_or_else(malformed)?;

        let mut macro_def = Self {
            key: String::new(),
            def_args: Vec::new(),
            def_multi: None,
            rep_multi: None,
            expansion: String::new(),
            inplace: None,
        };
        macro_def.parse_definition(rest[..split].trim(), line)?;
        macro_def.parse_expansion(rest[split + 2..].trim(), line)?;
        Ok(macro_def)
    }

    fn parse_definition(&mut self, def: &str, line: &str) -> Result<()> {
        let malformed = || AmtaError::new(ErrorKind::MalformedMacro(line.to_string()));
        let chars: Vec<char> = def.chars().collect();
        let mut i = 0;
        while i < chars.len() && is_ident(chars[i]) {
            self.key.push(chars[i]);
            i += 1;
        }
        if self.key.is_empty() {
            return Err(malformed());
        }
        if i < chars.len() && chars[i] == '(' {
            let closing = chars.iter().position(|&c| c == ')').ok_or_else(malformed)?;
            let inner: String = chars[i + 1..closing].iter().collect();
            self.def_args = inner.split(',').map(|a| a.trim().to_string()).collect();
            i = closing + 1;
        }
        if i < chars.len() && chars[i] == '[' {
            let closing = chars.iter().position(|&c| c == ']').ok_or_else(malformed)?;
            self.def_multi = Some(chars[i + 1..closing].iter().collect());
        }
        Ok(())
    }

    fn parse_expansion(&mut self, expansion: &str, line: &str) -> Result<()> {
        let malformed = || AmtaError::new(ErrorKind::MalformedMacro(line.to_string()));
        // "\n" in the template is a literal embedded newline.
        let expansion = expansion.replace("\\n", "\n");
        let chars: Vec<char> = expansion.chars().collect();
        let mut i = 0;
        if i < chars.len() && chars[i] == '[' {
            let closing = chars.iter().position(|&c| c == ']').ok_or_else(malformed)?;
            self.rep_multi = Some(chars[i + 1..closing].iter().collect());
            i = closing + 1;
        }
        while i < chars.len() && chars[i] != '{' {
            self.expansion.push(chars[i]);
            i += 1;
        }
        if i < chars.len() && chars[i] == '{' {
            let closing = chars.iter().position(|&c| c == '}').ok_or_else(malformed)?;
            self.inplace = Some(chars[i + 1..closing].iter().collect());
        }
        Ok(())
    }

    /// Expand one invocation, returning the replacement for the whole
    /// line. `None` means the marker at the scan site belongs to a
    /// different key; the caller skips it rather than erroring.
    pub fn expand(&self, line: &str) -> Result<Option<String>> {
        let chars: Vec<char> = line.chars().collect();
        let call_start = match chars.iter().position(|&c| c == '^') {
            Some(idx) => idx,
            None => return Ok(None),
        };

        let mut i = call_start + 1;
        let mut call_key = String::new();
        while i < chars.len() && is_ident(chars[i]) {
            call_key.push(chars[i]);
            i += 1;
        }
        if call_key != self.key {
            return Ok(None);
        }

        let mut call_args = Vec::new();
        if i < chars.len() && chars[i] == '(' {
            i = split_list(&chars, i + 1, '(', ')', &mut call_args);
        }
        let mut call_multi = Vec::new();
        if i < chars.len() && chars[i] == '[' {
            i = split_list(&chars, i + 1, '[', ']', &mut call_multi);
        }

        let mut result = String::new();
        if let (Some(def_multi), Some(rep_multi)) = (&self.def_multi, &self.rep_multi) {
            config::debug(format!("expanding multi args of ^{}", self.key));
            for (k, arg) in call_multi.iter().enumerate() {
                let template = rep_multi.replace(def_multi, arg).replace("%..%", &k.to_string());
                result.push_str(&self.apply_args(&template, &call_args)?);
            }
        }
        result.push_str(&self.apply_args(&self.expansion, &call_args)?);
        if let Some(inplace) = &self.inplace {
            let spliced = self.apply_args(inplace, &call_args)?;
            let before: String = chars[..call_start].iter().collect();
            let after: String = chars[i.min(chars.len())..].iter().collect();
            result.push('\n');
            result.push_str(&before);
            result.push_str(&spliced);
            result.push_str(&after);
        }
        Ok(Some(result))
    }

    fn apply_args(&self, template: &str, call_args: &[String]) -> Result<String> {
        if call_args.len() != self.def_args.len() {
            return Err(AmtaError::new(ErrorKind::MacroArity {
                key: self.key.clone(),
                expected: self.def_args.len(),
                got: call_args.len(),
            }));
        }
        let mut result = template.to_string();
        for (formal, actual) in self.def_args.iter().zip(call_args) {
            result = result.replace(formal.as_str(), actual);
        }
        Ok(result)
    }
}

/// Split a parenthesised or bracketed argument list, comma-separated.
///
/// Commas inside string literals or nested brackets/parens do not split.
/// `from` points just past the opening delimiter; returns the index just
/// past the matching closer.
fn split_list(
    chars: &[char],
    from: usize,
    open: char,
    close: char,
    out: &mut Vec<String>,
) -> usize {
    let mut arg = String::new();
    let mut in_str = false;
    let mut depth = 1;
    let mut paren_depth = 0;
    let mut i = from;
    while i < chars.len() && depth > 0 {
        let c = chars[i];
        match c {
            _ if c == open => {
                depth += 1;
                arg.push(c);
            }
            _ if c == close => {
                depth -= 1;
                if depth > 0 {
                    arg.push(c);
                }
            }
            '"' => {
                in_str = !in_str;
                arg.push(c);
            }
            '(' if !in_str => {
                paren_depth += 1;
                arg.push(c);
            }
            ')' if !in_str => {
                paren_depth -= 1;
                arg.push(c);
            }
            ',' if !in_str && depth == 1 && paren_depth == 0 => {
                out.push(arg.trim().to_string());
                arg.clear();
            }
            _ => arg.push(c),
        }
        i += 1;
    }
    if !arg.trim().is_empty() {
        out.push(arg.trim().to_string());
    }
    i
}

/// Run the whole preprocessor pass over a script.
///
/// Strips comments, collects and removes `MACRO` lines, then expands
/// invocations to a fixed point.
pub fn expand_macros(script: &str) -> Result<String> {
    let mut macros: Vec<Macro> = Vec::new();
    let mut stripped = String::new();
    for raw_line in script.split('\n') {
        let line = raw_line.trim();
        if line.starts_with("MACRO ") {
            macros.push(Macro::parse(line)?);
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        stripped.push_str(raw_line);
        stripped.push('\n');
    }
    config::debug(format!("stripped script:\n{}", stripped));
    for macro_def in &macros {
        config::debug(format!("{:?}", macro_def));
    }

    let mut script = stripped;
    let mut substituted = 1;
    while script.contains('^') && substituted > 0 {
        substituted = 0;
        for macro_def in &macros {
            let marker = format!("^{}", macro_def.key);
            while let Some(marker_idx) = script.find(&marker) {
                let line_start = script[..marker_idx].rfind('\n').map_or(0, |p| p + 1);
                let line_end = script[marker_idx..]
                    .find('\n')
                    .map_or(script.len(), |p| p + marker_idx);
                let line = script[line_start..line_end].to_string();
                let Some(expansion) = macro_def.expand(&line)? else {
                    // Marker for a different key; tolerate and move on.
                    break;
                };
                config::debug(format!("expanding line\n{}\nto\n{}", line, expansion));
                script.replace_range(line_start..line_end, &expansion);
                substituted += 1;
            }
        }
    }
    config::debug(format!("fully expanded script:\n{}", script));
    Ok(script)
}
