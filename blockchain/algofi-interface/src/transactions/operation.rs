use crate::common::Address;
use crate::transactions::encoding;
use common::asset_utils::transfer_asset_id;

/// Chain parameters every operation is stamped with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedParams {
    pub fee: u64,
    pub min_fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
}

/// What an application call asks the application to do besides running its logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnComplete {
    #[default]
    NoOp = 0,
    OptIn = 1,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationBody {
    Payment {
        receiver: Address,
        amount: u64,
    },
    AssetTransfer {
        receiver: Address,
        amount: u64,
        asset_id: u64,
    },
    AppCall {
        app_id: u64,
        on_complete: OnComplete,
        args: Vec<Vec<u8>>,
        foreign_apps: Vec<u64>,
        foreign_assets: Vec<u64>,
        accounts: Vec<Address>,
    },
}

/// One ledger operation, unsigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub sender: Address,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
    pub note: Vec<u8>,
    pub group: Option<[u8; 32]>,
    pub rekey_to: Option<Address>,
    pub body: OperationBody,
}

impl Operation {
    pub fn new(sender: Address, params: &SuggestedParams, fee: u64, body: OperationBody) -> Self {
        Self {
            sender,
            fee,
            first_valid: params.first_valid,
            last_valid: params.last_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            note: Vec::new(),
            group: None,
            rekey_to: None,
            body,
        }
    }

    /// Application no-op call dispatching on `tag`
    pub fn app_call(
        sender: Address,
        params: &SuggestedParams,
        fee: u64,
        app_id: u64,
        tag: &str,
    ) -> Self {
        Self::new(
            sender,
            params,
            fee,
            OperationBody::AppCall {
                app_id,
                on_complete: OnComplete::NoOp,
                args: vec![tag.as_bytes().to_vec()],
                foreign_apps: Vec::new(),
                foreign_assets: Vec::new(),
                accounts: Vec::new(),
            },
        )
    }

    pub fn app_opt_in(sender: Address, params: &SuggestedParams, fee: u64, app_id: u64) -> Self {
        Self::new(
            sender,
            params,
            fee,
            OperationBody::AppCall {
                app_id,
                on_complete: OnComplete::OptIn,
                args: Vec::new(),
                foreign_apps: Vec::new(),
                foreign_assets: Vec::new(),
                accounts: Vec::new(),
            },
        )
    }

    /// Payment for the native asset, asset transfer otherwise
    pub fn transfer(
        sender: Address,
        params: &SuggestedParams,
        fee: u64,
        receiver: Address,
        amount: u64,
        asset_id: u64,
    ) -> Self {
        let body = match transfer_asset_id(asset_id) {
            None => OperationBody::Payment { receiver, amount },
            Some(asset_id) => OperationBody::AssetTransfer { receiver, amount, asset_id },
        };
        Self::new(sender, params, fee, body)
    }

    pub fn with_note(mut self, note: impl Into<Vec<u8>>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_rekey_to(mut self, rekey_to: Address) -> Self {
        self.rekey_to = Some(rekey_to);
        self
    }

    /// Append an application argument
    pub fn with_arg(mut self, arg: impl Into<Vec<u8>>) -> Self {
        if let OperationBody::AppCall { args, .. } = &mut self.body {
            args.push(arg.into());
        }
        self
    }

    /// Append an 8-byte big-endian integer argument
    pub fn with_int_arg(self, value: u64) -> Self {
        self.with_arg(value.to_be_bytes().to_vec())
    }

    pub fn with_foreign_apps(mut self, apps: &[u64]) -> Self {
        if let OperationBody::AppCall { foreign_apps, .. } = &mut self.body {
            foreign_apps.extend_from_slice(apps);
        }
        self
    }

    pub fn with_foreign_assets(mut self, assets: &[u64]) -> Self {
        if let OperationBody::AppCall { foreign_assets, .. } = &mut self.body {
            foreign_assets.extend_from_slice(assets);
        }
        self
    }

    pub fn with_accounts(mut self, addresses: &[Address]) -> Self {
        if let OperationBody::AppCall { accounts, .. } = &mut self.body {
            accounts.extend_from_slice(addresses);
        }
        self
    }

    pub fn app_id(&self) -> Option<u64> {
        match &self.body {
            OperationBody::AppCall { app_id, .. } => Some(*app_id),
            _ => None,
        }
    }

    /// First application argument, the dispatch tag of a protocol call
    pub fn tag(&self) -> Option<&[u8]> {
        match &self.body {
            OperationBody::AppCall { args, .. } => args.first().map(Vec::as_slice),
            _ => None,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag() == Some(tag.as_bytes())
    }

    pub fn foreign_apps(&self) -> &[u64] {
        match &self.body {
            OperationBody::AppCall { foreign_apps, .. } => foreign_apps,
            _ => &[],
        }
    }

    pub fn accounts(&self) -> &[Address] {
        match &self.body {
            OperationBody::AppCall { accounts, .. } => accounts,
            _ => &[],
        }
    }

    /// Canonical encoding of the unsigned operation
    pub fn encode(&self) -> Vec<u8> {
        encoding::encode_operation(self)
    }

    /// Raw 32-byte operation id
    pub fn raw_id(&self) -> [u8; 32] {
        encoding::operation_id_raw(self)
    }

    /// Printable operation id
    pub fn id(&self) -> String {
        encoding::operation_id(self)
    }
}
