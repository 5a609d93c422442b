//! Static symbol tables for math rendering.
//!
//! Built once on first use and never mutated. Command lookups are exact
//! matches on the full command name, so no entry shadows another.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Named commands (`\alpha`, `\leq`, ...) to their Unicode rendering.
pub static COMMANDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.extend(GREEK.iter().copied());
    map.extend(OPERATORS.iter().copied());
    map.extend(ARROWS.iter().copied());
    map.extend(MISC.iter().copied());
    map
});

/// Characters with a Unicode superscript form.
pub static SUPERSCRIPTS: Lazy<HashMap<char, char>> = Lazy::new(|| {
    "0123456789+-=()abcdefghijklmnoprstuvwxyz"
        .chars()
        .zip("⁰¹²³⁴⁵⁶⁷⁸⁹⁺⁻⁼⁽⁾ᵃᵇᶜᵈᵉᶠᵍʰⁱʲᵏˡᵐⁿᵒᵖʳˢᵗᵘᵛʷˣʸᶻ".chars())
        .collect()
});

/// Characters with a Unicode subscript form.
pub static SUBSCRIPTS: Lazy<HashMap<char, char>> = Lazy::new(|| {
    "0123456789+-=()aehijklmnoprstuvx"
        .chars()
        .zip("₀₁₂₃₄₅₆₇₈₉₊₋₌₍₎ₐₑₕᵢⱼₖₗₘₙₒₚᵣₛₜᵤᵥₓ".chars())
        .collect()
});

const GREEK: &[(&str, &str)] = &[
    ("alpha", "α"),
    ("beta", "β"),
    ("gamma", "γ"),
    ("delta", "δ"),
    ("epsilon", "ε"),
    ("varepsilon", "ε"),
    ("zeta", "ζ"),
    ("eta", "η"),
    ("theta", "θ"),
    ("vartheta", "ϑ"),
    ("iota", "ι"),
    ("kappa", "κ"),
    ("lambda", "λ"),
    ("mu", "μ"),
    ("nu", "ν"),
    ("xi", "ξ"),
    ("omicron", "ο"),
    ("pi", "π"),
    ("varpi", "ϖ"),
    ("rho", "ρ"),
    ("varrho", "ϱ"),
    ("sigma", "σ"),
    ("varsigma", "ς"),
    ("tau", "τ"),
    ("upsilon", "υ"),
    ("phi", "φ"),
    ("varphi", "ϕ"),
    ("chi", "χ"),
    ("psi", "ψ"),
    ("omega", "ω"),
    ("Gamma", "Γ"),
    ("Delta", "Δ"),
    ("Theta", "Θ"),
    ("Lambda", "Λ"),
    ("Xi", "Ξ"),
    ("Pi", "Π"),
    ("Sigma", "Σ"),
    ("Upsilon", "Υ"),
    ("Phi", "Φ"),
    ("Psi", "Ψ"),
    ("Omega", "Ω"),
];

const OPERATORS: &[(&str, &str)] = &[
    ("times", "×"),
    ("div", "÷"),
    ("pm", "±"),
    ("mp", "∓"),
    ("cdot", "·"),
    ("ast", "∗"),
    ("star", "⋆"),
    ("circ", "∘"),
    ("bullet", "•"),
    ("leq", "≤"),
    ("le", "≤"),
    ("geq", "≥"),
    ("ge", "≥"),
    ("neq", "≠"),
    ("ne", "≠"),
    ("approx", "≈"),
    ("equiv", "≡"),
    ("sim", "∼"),
    ("simeq", "≃"),
    ("cong", "≅"),
    ("propto", "∝"),
    ("ll", "≪"),
    ("gg", "≫"),
    ("infty", "∞"),
    ("partial", "∂"),
    ("nabla", "∇"),
    ("sum", "∑"),
    ("prod", "∏"),
    ("coprod", "∐"),
    ("int", "∫"),
    ("iint", "∬"),
    ("oint", "∮"),
    ("in", "∈"),
    ("notin", "∉"),
    ("ni", "∋"),
    ("subset", "⊂"),
    ("supset", "⊃"),
    ("subseteq", "⊆"),
    ("supseteq", "⊇"),
    ("cup", "∪"),
    ("cap", "∩"),
    ("setminus", "∖"),
    ("emptyset", "∅"),
    ("varnothing", "∅"),
    ("forall", "∀"),
    ("exists", "∃"),
    ("neg", "¬"),
    ("lnot", "¬"),
    ("land", "∧"),
    ("wedge", "∧"),
    ("lor", "∨"),
    ("vee", "∨"),
    ("oplus", "⊕"),
    ("otimes", "⊗"),
    ("perp", "⊥"),
    ("parallel", "∥"),
    ("mid", "∣"),
    ("angle", "∠"),
];

const ARROWS: &[(&str, &str)] = &[
    ("to", "→"),
    ("rightarrow", "→"),
    ("leftarrow", "←"),
    ("gets", "←"),
    ("leftrightarrow", "↔"),
    ("Rightarrow", "⇒"),
    ("Leftarrow", "⇐"),
    ("Leftrightarrow", "⇔"),
    ("implies", "⟹"),
    ("iff", "⟺"),
    ("mapsto", "↦"),
    ("uparrow", "↑"),
    ("downarrow", "↓"),
];

const MISC: &[(&str, &str)] = &[
    ("ldots", "…"),
    ("cdots", "⋯"),
    ("vdots", "⋮"),
    ("ddots", "⋱"),
    ("dots", "…"),
    ("prime", "′"),
    ("degree", "°"),
    ("hbar", "ℏ"),
    ("ell", "ℓ"),
    ("Re", "ℜ"),
    ("Im", "ℑ"),
    ("aleph", "ℵ"),
    ("langle", "⟨"),
    ("rangle", "⟩"),
    ("lfloor", "⌊"),
    ("rfloor", "⌋"),
    ("lceil", "⌈"),
    ("rceil", "⌉"),
    ("therefore", "∴"),
    ("because", "∵"),
    ("quad", "  "),
    ("qquad", "    "),
    // Function names render upright, as themselves.
    ("sin", "sin"),
    ("cos", "cos"),
    ("tan", "tan"),
    ("log", "log"),
    ("ln", "ln"),
    ("exp", "exp"),
    ("lim", "lim"),
    ("max", "max"),
    ("min", "min"),
    // Sizing and font commands vanish, leaving their argument.
    ("left", ""),
    ("right", ""),
    ("text", ""),
    ("mathrm", ""),
    ("mathbf", ""),
    ("mathit", ""),
    ("operatorname", ""),
];

/// Looks up a command name without its backslash.
pub fn command(name: &str) -> Option<&'static str> {
    COMMANDS.get(name).copied()
}

pub fn superscript(c: char) -> Option<char> {
    SUPERSCRIPTS.get(&c).copied()
}

pub fn subscript(c: char) -> Option<char> {
    SUBSCRIPTS.get(&c).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_zip_completely() {
        assert_eq!(SUPERSCRIPTS.len(), 40);
        assert_eq!(SUBSCRIPTS.len(), 32);
    }

    #[test]
    fn test_lookups() {
        assert_eq!(command("alpha"), Some("α"));
        assert_eq!(command("Omega"), Some("Ω"));
        assert_eq!(command("zzz"), None);
        assert_eq!(superscript('2'), Some('²'));
        assert_eq!(subscript('i'), Some('ᵢ'));
        assert_eq!(subscript('q'), None);
    }
}
