//! Newick label rewriting
//!
//! kSNP4 only accepts genome names without dots, so `1280.5001` becomes
//! `1280_5001` on the way in. Tree labels are turned back into genome ids here
//! so the phyloXML converter can join them to metadata. Only labels change;
//! branch lengths, comments and topology are copied through untouched.

/// Replace `_` with `.` in every clade label of a Newick string.
pub fn relabel_newick(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_quote = false;
    let mut in_comment = false;
    let mut in_length = false;

    while let Some(c) = chars.next() {
        if in_comment {
            if c == ']' {
                in_comment = false;
            }
            out.push(c);
            continue;
        }

        if in_quote {
            if c == '\'' {
                // '' is an escaped quote inside a quoted label
                if let Some(next) = chars.next_if_eq(&'\'') {
                    out.push(c);
                    out.push(next);
                    continue;
                }
                in_quote = false;
                out.push(c);
            } else {
                out.push(if c == '_' { '.' } else { c });
            }
            continue;
        }

        match c {
            '[' => {
                in_comment = true;
                out.push(c);
            }
            '\'' => {
                in_quote = true;
                in_length = false;
                out.push(c);
            }
            ':' => {
                in_length = true;
                out.push(c);
            }
            '(' | ')' | ',' | ';' => {
                in_length = false;
                out.push(c);
            }
            '_' if !in_length => out.push('.'),
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relabel_leaves_and_internal_nodes() {
        let tree = "((1280_5001:0.1,1280_5002:0.2)node_1:0.05,562_7:0.3);";
        assert_eq!(
            relabel_newick(tree),
            "((1280.5001:0.1,1280.5002:0.2)node.1:0.05,562.7:0.3);"
        );
    }

    #[test]
    fn test_branch_lengths_and_comments_untouched() {
        let tree = "(a_b:1e-5[&&NHX:S=x_y],c_d:2)[root_comment];";
        assert_eq!(relabel_newick(tree), "(a.b:1e-5[&&NHX:S=x_y],c.d:2)[root_comment];");
    }

    #[test]
    fn test_quoted_labels() {
        let tree = "('genome_one''s':1,'x_y':2);";
        assert_eq!(relabel_newick(tree), "('genome.one''s':1,'x.y':2);");
    }

    #[test]
    fn test_no_labels() {
        assert_eq!(relabel_newick("(,(,));"), "(,(,));");
        assert_eq!(relabel_newick(""), "");
    }
}
