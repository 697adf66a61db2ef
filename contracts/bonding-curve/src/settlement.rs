use casper_contract::contract_api::{runtime, system};
use casper_types::{
    addressable_entity::AddressableEntityHash, contracts::ContractHash, runtime_args, Key,
    RuntimeArgs, URef,
};
use sale_core::{curves::narrow, PaymentAsset, SaleError, Settlement, SettlementPlan};

/// Settles a purchase inside the running deploy.
///
/// Legs run one after another; the caller reverts on the first error, which
/// rolls back every leg already executed along with the rest of the deploy.
pub struct CasperSettlement {
    /// Token being sold, minted to the buyer
    token: Key,
    /// Buyer's purse for native payment
    purse: Option<URef>,
}

impl CasperSettlement {
    pub fn new(token: Key, purse: Option<URef>) -> Self {
        Self { token, purse }
    }
}

fn contract_of(key: Key) -> Result<ContractHash, SaleError> {
    match key {
        Key::AddressableEntity(entity_addr) => {
            Ok(AddressableEntityHash::new(entity_addr.value()).into())
        }
        Key::Hash(hash) => Ok(ContractHash::new(hash)),
        _ => Err(SaleError::TransferFailed),
    }
}

impl Settlement<Key> for CasperSettlement {
    fn settle(&mut self, plan: &SettlementPlan<Key>) -> Result<(), SaleError> {
        match &plan.asset {
            PaymentAsset::Native => {
                let purse = self.purse.ok_or(SaleError::InsufficientPayment)?;
                for leg in &plan.legs {
                    let Key::Account(account) = leg.to else {
                        return Err(SaleError::TransferFailed);
                    };
                    system::transfer_from_purse_to_account(purse, account, leg.amount, None)
                        .map_err(|_| SaleError::InsufficientBalance)?;
                }
            }
            PaymentAsset::Token(payment_token) => {
                let payment_contract = contract_of(*payment_token)?;
                for leg in &plan.legs {
                    let amount = narrow(leg.amount)?;
                    runtime::call_contract::<()>(
                        payment_contract,
                        "transfer_from",
                        runtime_args! {
                            "owner" => plan.payer,
                            "recipient" => leg.to,
                            "amount" => amount
                        },
                    );
                }
            }
        }

        runtime::call_contract::<()>(
            contract_of(self.token)?,
            "mint",
            runtime_args! {
                "to" => plan.payer,
                "amount" => plan.delivery
            },
        );
        Ok(())
    }
}
