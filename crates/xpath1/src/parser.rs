//! XPath 1.0 parser: a pest grammar plus the pair-walking AST builder.

use pest::iterators::Pair;
use pest::Parser;

use crate::runtime::Error;

pub mod ast;

use ast::{Axis, BinaryOp, Expr, LocationPath, NodeTest, Step};

#[derive(pest_derive::Parser)]
#[grammar = "xpath1.pest"]
struct XPathGrammar;

/// Parses an XPath 1.0 expression into its syntax tree.
pub fn parse(source: &str) -> Result<Expr, Error> {
    let mut pairs = XPathGrammar::parse(Rule::xpath, source)
        .map_err(|e| Error::Parse(e.to_string()))?;
    let xpath = pairs.next().ok_or_else(|| malformed(source))?;
    let expr = xpath
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| malformed(source))?;
    build_expr(expr)
}

fn malformed(source: &str) -> Error {
    Error::Parse(format!("malformed expression: {}", source))
}

type PResult = Result<Expr, Error>;

fn build_expr(pair: Pair<Rule>) -> PResult {
    match pair.as_rule() {
        Rule::expr => build_only_child(pair),
        Rule::or_expr => build_chain(pair, |_| BinaryOp::Or),
        Rule::and_expr => build_chain(pair, |_| BinaryOp::And),
        Rule::equality_expr => build_chain(pair, |op| match op {
            "!=" => BinaryOp::Neq,
            _ => BinaryOp::Eq,
        }),
        Rule::relational_expr => build_chain(pair, |op| match op {
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Lte,
            ">" => BinaryOp::Gt,
            _ => BinaryOp::Gte,
        }),
        Rule::additive_expr => build_chain(pair, |op| match op {
            "+" => BinaryOp::Add,
            _ => BinaryOp::Subtract,
        }),
        Rule::multiplicative_expr => build_chain(pair, |op| match op {
            "*" => BinaryOp::Multiply,
            "div" => BinaryOp::Div,
            _ => BinaryOp::Mod,
        }),
        Rule::unary_expr => {
            let src = pair.as_str().to_string();
            let mut negations = 0usize;
            let mut operand = None;
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::minus => negations += 1,
                    _ => operand = Some(build_expr(p)?),
                }
            }
            let mut e = operand.ok_or_else(|| malformed(&src))?;
            for _ in 0..negations {
                e = Expr::Negate(Box::new(e));
            }
            Ok(e)
        }
        Rule::union_expr => build_chain(pair, |_| BinaryOp::Union),
        Rule::path_expr => build_only_child(pair),
        Rule::filter_path => build_filter_path(pair),
        Rule::location_path => Ok(Expr::Path(build_location_path(pair)?)),
        Rule::primary_expr => build_only_child(pair),
        Rule::variable_reference => {
            let (prefix, local) = split_qname(pair.as_str().trim_start_matches('$').trim());
            Ok(Expr::VarRef { prefix, local })
        }
        Rule::literal => Ok(Expr::Literal(unquote(pair.as_str()))),
        Rule::number => pair
            .as_str()
            .parse::<f64>()
            .map(Expr::Number)
            .map_err(|_| malformed(pair.as_str())),
        Rule::function_call => build_function_call(pair),
        _ => Err(malformed(pair.as_str())),
    }
}

/// Every binary level shares the shape `operand (op operand)*`; fold
/// left-associatively, mapping the operator token through `op_of`.
fn build_chain(pair: Pair<Rule>, op_of: fn(&str) -> BinaryOp) -> PResult {
    let src = pair.as_str().to_string();
    let mut inner = pair.into_inner();
    let first = inner.next().ok_or_else(|| malformed(&src))?;
    let mut lhs = build_expr(first)?;
    let mut pending_op: Option<BinaryOp> = None;
    for p in inner {
        match p.as_rule() {
            Rule::eq_op | Rule::rel_op | Rule::add_op | Rule::mul_op => {
                pending_op = Some(op_of(p.as_str().trim()));
            }
            _ => {
                let rhs = build_expr(p)?;
                let op = pending_op.take().unwrap_or_else(|| op_of(""));
                lhs = Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
            }
        }
    }
    Ok(lhs)
}

fn build_only_child(pair: Pair<Rule>) -> PResult {
    let src = pair.as_str().to_string();
    let child = pair.into_inner().next().ok_or_else(|| malformed(&src))?;
    build_expr(child)
}

fn build_function_call(pair: Pair<Rule>) -> PResult {
    let mut name = None;
    let mut args = Vec::new();
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::qname => name = Some(split_qname(p.as_str())),
            Rule::expr => args.push(build_expr(p)?),
            _ => {}
        }
    }
    let (prefix, local) = name.ok_or_else(|| malformed("function call"))?;
    Ok(Expr::FunctionCall {
        prefix,
        local,
        args,
    })
}

fn build_filter_path(pair: Pair<Rule>) -> PResult {
    let src = pair.as_str().to_string();
    let mut inner = pair.into_inner();
    let filter = inner.next().ok_or_else(|| malformed(&src))?;

    let mut primary = None;
    let mut predicates = Vec::new();
    for p in filter.into_inner() {
        match p.as_rule() {
            Rule::predicate => predicates.push(build_predicate(p)?),
            _ => primary = Some(build_expr(p)?),
        }
    }
    let primary = primary.ok_or_else(|| malformed(&src))?;

    let mut steps = Vec::new();
    let mut has_path = false;
    for p in inner {
        match p.as_rule() {
            Rule::dslash => {
                has_path = true;
                steps.push(Step::kind_test(Axis::DescendantOrSelf, NodeTest::Node));
            }
            Rule::slash => has_path = true,
            Rule::relative_location_path => {
                has_path = true;
                build_relative_path(p, &mut steps)?;
            }
            _ => {}
        }
    }

    if predicates.is_empty() && !has_path {
        return Ok(primary);
    }
    Ok(Expr::Filter {
        primary: Box::new(primary),
        predicates,
        path: if has_path {
            Some(LocationPath {
                absolute: false,
                steps,
            })
        } else {
            None
        },
    })
}

fn build_predicate(pair: Pair<Rule>) -> PResult {
    build_only_child(pair)
}

fn build_location_path(pair: Pair<Rule>) -> Result<LocationPath, Error> {
    let src = pair.as_str().to_string();
    let child = pair.into_inner().next().ok_or_else(|| malformed(&src))?;
    match child.as_rule() {
        Rule::relative_location_path => {
            let mut steps = Vec::new();
            build_relative_path(child, &mut steps)?;
            Ok(LocationPath {
                absolute: false,
                steps,
            })
        }
        Rule::absolute_path => {
            let mut steps = Vec::new();
            for p in child.into_inner() {
                match p.as_rule() {
                    Rule::dslash => {
                        steps.push(Step::kind_test(Axis::DescendantOrSelf, NodeTest::Node))
                    }
                    Rule::slash => {}
                    Rule::relative_location_path => build_relative_path(p, &mut steps)?,
                    _ => return Err(malformed(&src)),
                }
            }
            Ok(LocationPath {
                absolute: true,
                steps,
            })
        }
        _ => Err(malformed(&src)),
    }
}

fn build_relative_path(pair: Pair<Rule>, steps: &mut Vec<Step>) -> Result<(), Error> {
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::step => steps.push(build_step(p)?),
            Rule::dslash => {
                steps.push(Step::kind_test(Axis::DescendantOrSelf, NodeTest::Node))
            }
            Rule::slash => {}
            _ => return Err(malformed(p.as_str())),
        }
    }
    Ok(())
}

fn build_step(pair: Pair<Rule>) -> Result<Step, Error> {
    let src = pair.as_str().to_string();
    let child = pair.into_inner().next().ok_or_else(|| malformed(&src))?;
    match child.as_rule() {
        Rule::dot => Ok(Step::kind_test(Axis::SelfAxis, NodeTest::Node)),
        Rule::dotdot => Ok(Step::kind_test(Axis::Parent, NodeTest::Node)),
        Rule::full_step => {
            let mut axis = Axis::Child;
            let mut node_test = None;
            let mut predicates = Vec::new();
            for p in child.into_inner() {
                match p.as_rule() {
                    Rule::axis_specifier => axis = build_axis(p)?,
                    Rule::node_test => node_test = Some(build_node_test(p)?),
                    Rule::predicate => predicates.push(build_predicate(p)?),
                    _ => return Err(malformed(&src)),
                }
            }
            Ok(Step {
                axis,
                node_test: node_test.ok_or_else(|| malformed(&src))?,
                predicates,
            })
        }
        _ => Err(malformed(&src)),
    }
}

fn build_axis(pair: Pair<Rule>) -> Result<Axis, Error> {
    let src = pair.as_str().to_string();
    let child = pair.into_inner().next().ok_or_else(|| malformed(&src))?;
    match child.as_rule() {
        Rule::at_sign => Ok(Axis::Attribute),
        Rule::axis_name => match child.as_str() {
            "child" => Ok(Axis::Child),
            "descendant" => Ok(Axis::Descendant),
            "parent" => Ok(Axis::Parent),
            "ancestor" => Ok(Axis::Ancestor),
            "following-sibling" => Ok(Axis::FollowingSibling),
            "preceding-sibling" => Ok(Axis::PrecedingSibling),
            "following" => Ok(Axis::Following),
            "preceding" => Ok(Axis::Preceding),
            "attribute" => Ok(Axis::Attribute),
            "namespace" => Ok(Axis::Namespace),
            "self" => Ok(Axis::SelfAxis),
            "descendant-or-self" => Ok(Axis::DescendantOrSelf),
            "ancestor-or-self" => Ok(Axis::AncestorOrSelf),
            other => Err(malformed(other)),
        },
        _ => Err(malformed(&src)),
    }
}

fn build_node_test(pair: Pair<Rule>) -> Result<NodeTest, Error> {
    let src = pair.as_str().to_string();
    let child = pair.into_inner().next().ok_or_else(|| malformed(&src))?;
    match child.as_rule() {
        Rule::pi_test => {
            let target = child
                .into_inner()
                .find(|p| p.as_rule() == Rule::literal)
                .map(|p| unquote(p.as_str()));
            Ok(NodeTest::Pi(target))
        }
        Rule::node_type_test => {
            let ty = child
                .into_inner()
                .next()
                .ok_or_else(|| malformed(&src))?;
            match ty.as_str() {
                "node" => Ok(NodeTest::Node),
                "text" => Ok(NodeTest::Text),
                _ => Ok(NodeTest::Comment),
            }
        }
        Rule::name_test => {
            let (prefix, local) = split_qname(child.as_str());
            Ok(NodeTest::Name { prefix, local })
        }
        _ => Err(malformed(&src)),
    }
}

fn split_qname(s: &str) -> (Option<String>, String) {
    match s.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, s.to_string()),
    }
}

fn unquote(s: &str) -> String {
    let mut chars = s.chars();
    chars.next();
    chars.next_back();
    chars.as_str().to_string()
}
