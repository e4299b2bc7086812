//! Bytecode preparation: library placeholder substitution followed by
//! ABI-encoded constructor arguments appended to the creation bytecode.

use chaincode_common::logger;
use chaincode_types::{ContractSpec, InputSpec, VariableValue};
use ethers::{
    abi::{encode, ParamType, Token},
    types::Address,
};

use crate::{
    error::{OrchestratorError, Result},
    resolve::{resolve, Results},
};

/// The constructor descriptor inferred from a step's inputs. Only `address`
/// parameters are expressible today.
#[derive(Debug)]
struct ConstructorAbi {
    params: Vec<ParamType>,
    payable: bool,
}

fn infer_param_type(input: &InputSpec) -> Result<ParamType> {
    if let Some(ty) = &input.declared_type {
        return match ty.as_str() {
            "address" => Ok(ParamType::Address),
            other => Err(OrchestratorError::Unsupported(format!(
                "constructor input type {other:?} is not supported"
            ))),
        };
    }
    match &input.value {
        VariableValue::AddressPointer(_) | VariableValue::SpecialAddress(_) => {
            Ok(ParamType::Address)
        }
        VariableValue::Literal(raw) => Err(OrchestratorError::Unsupported(format!(
            "cannot infer a constructor type for bare literal {raw:?}; declare \"Type\""
        ))),
    }
}

/// Produce the final creation bytecode for `spec`.
///
/// Library placeholders are replaced textually by the resolved address with
/// its `0x` prefix stripped. If the step declares inputs, they are resolved
/// and ABI-encoded onto the end of the bytecode. Deploying via a named
/// function rather than the constructor is not implemented.
pub fn link(
    raw_bytecode: &str,
    spec: &ContractSpec,
    account: Address,
    results: &Results,
    func_name: Option<&str>,
) -> Result<String> {
    let mut bytecode = raw_bytecode.to_string();

    for (placeholder, value) in &spec.libraries {
        let resolved = resolve(value, account, results)?;
        let stripped = resolved.strip_prefix("0x").unwrap_or(&resolved);
        bytecode = bytecode.replace(placeholder.as_str(), stripped);
    }

    if !spec.inputs.is_empty() {
        if let Some(func) = func_name {
            return Err(OrchestratorError::Unsupported(format!(
                "deploying via function call {func:?} is not supported; only constructors"
            )));
        }

        let abi = ConstructorAbi {
            params: spec
                .inputs
                .iter()
                .map(infer_param_type)
                .collect::<Result<Vec<_>>>()?,
            payable: spec.value.is_some(),
        };

        let mut tokens = Vec::with_capacity(spec.inputs.len());
        for (input, param) in spec.inputs.iter().zip(&abi.params) {
            let resolved = resolve(&input.value, account, results)?;
            match param {
                ParamType::Address => {
                    let addr: Address = resolved.parse().map_err(|_| {
                        OrchestratorError::Unsupported(format!(
                            "constructor input {resolved:?} is not a valid address"
                        ))
                    })?;
                    tokens.push(Token::Address(addr));
                }
                // infer_param_type only produces Address today.
                other => {
                    return Err(OrchestratorError::Unsupported(format!(
                        "constructor input type {other} is not supported"
                    )))
                }
            }
        }

        logger::debug(format!(
            "constructor for {}: {} address arg(s){}",
            spec.name,
            tokens.len(),
            if abi.payable { ", payable" } else { "" }
        ));
        bytecode.push_str(&hex::encode(encode(&tokens)));
    }

    Ok(bytecode)
}
