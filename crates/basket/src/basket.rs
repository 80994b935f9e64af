use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalogue::Product;
use storefront_core::{
    Aggregate, AggregateRoot, BasketId, DomainError, DomainResult, Money, ProductId, StockRecordId,
    UserId,
};
use storefront_events::Event;
use storefront_partner::PurchaseInfo;

/// Basket status lifecycle.
///
/// `Open` baskets can be edited. `Frozen` baskets are locked during checkout
/// and can be thawed back to `Open`. `Submitted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasketStatus {
    Open,
    Frozen,
    Submitted,
}

/// A basket line: one sellable product bought from one stock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub product_id: ProductId,
    pub stockrecord_id: StockRecordId,
    pub quantity: u32,
    /// Price when the line was first added.
    pub unit_price: Money,
}

impl Line {
    pub fn line_price(&self) -> DomainResult<Money> {
        self.unit_price.times(self.quantity)
    }
}

/// Aggregate root: Basket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basket {
    id: BasketId,
    owner: Option<UserId>,
    status: BasketStatus,
    lines: Vec<Line>,
    date_submitted: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Basket {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: BasketId) -> Self {
        Self {
            id,
            owner: None,
            status: BasketStatus::Open,
            lines: Vec::new(),
            date_submitted: None,
            version: 0,
            created: false,
        }
    }

    /// A fresh, created basket.
    pub fn open(owner: Option<UserId>) -> Self {
        let id = BasketId::new();
        let mut basket = Self::empty(id);
        basket.apply(&BasketEvent::BasketCreated(BasketCreated {
            basket_id: id,
            owner,
            occurred_at: Utc::now(),
        }));
        basket
    }

    pub fn id_typed(&self) -> BasketId {
        self.id
    }

    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    pub fn status(&self) -> BasketStatus {
        self.status
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, product: ProductId, stockrecord: StockRecordId) -> Option<&Line> {
        self.lines
            .iter()
            .find(|l| l.product_id == product && l.stockrecord_id == stockrecord)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across lines.
    pub fn num_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn currency(&self) -> Option<&str> {
        self.lines.first().map(|l| l.unit_price.currency.as_str())
    }

    pub fn can_be_edited(&self) -> bool {
        self.status == BasketStatus::Open
    }

    pub fn date_submitted(&self) -> Option<DateTime<Utc>> {
        self.date_submitted
    }

    /// Sum of line prices; `None` for an empty basket.
    pub fn total(&self) -> DomainResult<Option<Money>> {
        let mut total: Option<Money> = None;
        for line in &self.lines {
            let price = line.line_price()?;
            total = Some(match total {
                Some(sum) => sum.checked_add(&price)?,
                None => price,
            });
        }
        Ok(total)
    }
}

impl AggregateRoot for Basket {
    type Id = BasketId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateBasket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBasket {
    pub basket_id: BasketId,
    pub owner: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddProduct {
    pub basket_id: BasketId,
    pub product_id: ProductId,
    pub stockrecord_id: StockRecordId,
    pub quantity: u32,
    pub unit_price: Money,
    pub occurred_at: DateTime<Utc>,
}

impl AddProduct {
    /// Build the command from a product and its purchase info, refusing
    /// parents and products that cannot be bought in this quantity.
    pub fn for_product(
        basket_id: BasketId,
        product: &Product,
        info: &PurchaseInfo,
        quantity: u32,
    ) -> DomainResult<Self> {
        if product.is_parent() {
            return Err(DomainError::validation(
                "A parent product can't be added to a basket. Choose one of its variants.",
            ));
        }
        let (Some(stockrecord_id), Some(unit_price)) = (info.stockrecord, info.price.clone()) else {
            return Err(DomainError::validation("This product is unavailable."));
        };
        info.availability
            .is_purchase_permitted(quantity)
            .map_err(DomainError::validation)?;
        Ok(Self {
            basket_id,
            product_id: product.id_typed(),
            stockrecord_id,
            quantity,
            unit_price,
            occurred_at: Utc::now(),
        })
    }
}

/// Command: UpdateLineQuantity. A quantity of zero removes the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLineQuantity {
    pub basket_id: BasketId,
    pub product_id: ProductId,
    pub stockrecord_id: StockRecordId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Freeze, Thaw, Submit (status transitions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub basket_id: BasketId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasketCommand {
    CreateBasket(CreateBasket),
    AddProduct(AddProduct),
    UpdateLineQuantity(UpdateLineQuantity),
    Freeze(ChangeStatus),
    Thaw(ChangeStatus),
    Submit(ChangeStatus),
}

/// Event: BasketCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketCreated {
    pub basket_id: BasketId,
    pub owner: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineAdded. Merges into an existing line for the same product and
/// stock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAdded {
    pub basket_id: BasketId,
    pub product_id: ProductId,
    pub stockrecord_id: StockRecordId,
    pub quantity: u32,
    pub unit_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineQuantityChanged (new absolute quantity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineQuantityChanged {
    pub basket_id: BasketId,
    pub product_id: ProductId,
    pub stockrecord_id: StockRecordId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRemoved {
    pub basket_id: BasketId,
    pub product_id: ProductId,
    pub stockrecord_id: StockRecordId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub basket_id: BasketId,
    pub status: BasketStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasketEvent {
    BasketCreated(BasketCreated),
    LineAdded(LineAdded),
    LineQuantityChanged(LineQuantityChanged),
    LineRemoved(LineRemoved),
    StatusChanged(StatusChanged),
}

impl Event for BasketEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BasketEvent::BasketCreated(_) => "basket.created",
            BasketEvent::LineAdded(_) => "basket.line_added",
            BasketEvent::LineQuantityChanged(_) => "basket.line_quantity_changed",
            BasketEvent::LineRemoved(_) => "basket.line_removed",
            BasketEvent::StatusChanged(e) => match e.status {
                BasketStatus::Open => "basket.thawed",
                BasketStatus::Frozen => "basket.frozen",
                BasketStatus::Submitted => "basket.submitted",
            },
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BasketEvent::BasketCreated(e) => e.occurred_at,
            BasketEvent::LineAdded(e) => e.occurred_at,
            BasketEvent::LineQuantityChanged(e) => e.occurred_at,
            BasketEvent::LineRemoved(e) => e.occurred_at,
            BasketEvent::StatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Basket {
    type Command = BasketCommand;
    type Event = BasketEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            BasketEvent::BasketCreated(e) => {
                self.id = e.basket_id;
                self.owner = e.owner;
                self.status = BasketStatus::Open;
                self.lines.clear();
                self.created = true;
            }
            BasketEvent::LineAdded(e) => {
                match self
                    .lines
                    .iter_mut()
                    .find(|l| l.product_id == e.product_id && l.stockrecord_id == e.stockrecord_id)
                {
                    Some(line) => line.quantity += e.quantity,
                    None => self.lines.push(Line {
                        product_id: e.product_id,
                        stockrecord_id: e.stockrecord_id,
                        quantity: e.quantity,
                        unit_price: e.unit_price.clone(),
                    }),
                }
            }
            BasketEvent::LineQuantityChanged(e) => {
                if let Some(line) = self
                    .lines
                    .iter_mut()
                    .find(|l| l.product_id == e.product_id && l.stockrecord_id == e.stockrecord_id)
                {
                    line.quantity = e.quantity;
                }
            }
            BasketEvent::LineRemoved(e) => {
                self.lines
                    .retain(|l| !(l.product_id == e.product_id && l.stockrecord_id == e.stockrecord_id));
            }
            BasketEvent::StatusChanged(e) => {
                self.status = e.status;
                if e.status == BasketStatus::Submitted {
                    self.date_submitted = Some(e.occurred_at);
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            BasketCommand::CreateBasket(cmd) => self.handle_create(cmd),
            BasketCommand::AddProduct(cmd) => self.handle_add(cmd),
            BasketCommand::UpdateLineQuantity(cmd) => self.handle_update(cmd),
            BasketCommand::Freeze(cmd) => {
                self.handle_status(cmd, BasketStatus::Open, BasketStatus::Frozen)
            }
            BasketCommand::Thaw(cmd) => {
                self.handle_status(cmd, BasketStatus::Frozen, BasketStatus::Open)
            }
            BasketCommand::Submit(cmd) => self.handle_submit(cmd),
        }
    }
}

impl Basket {
    fn ensure_created(&self) -> DomainResult<()> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_basket_id(&self, basket_id: BasketId) -> DomainResult<()> {
        if self.id != basket_id {
            return Err(DomainError::invariant("basket_id mismatch"));
        }
        Ok(())
    }

    fn ensure_editable(&self) -> DomainResult<()> {
        match self.status {
            BasketStatus::Open => Ok(()),
            BasketStatus::Frozen => Err(DomainError::invariant("basket is frozen")),
            BasketStatus::Submitted => Err(DomainError::invariant("basket has been submitted")),
        }
    }

    fn handle_create(&self, cmd: &CreateBasket) -> DomainResult<Vec<BasketEvent>> {
        if self.created {
            return Err(DomainError::conflict("basket already exists"));
        }
        Ok(vec![BasketEvent::BasketCreated(BasketCreated {
            basket_id: cmd.basket_id,
            owner: cmd.owner,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add(&self, cmd: &AddProduct) -> DomainResult<Vec<BasketEvent>> {
        self.ensure_created()?;
        self.ensure_basket_id(cmd.basket_id)?;
        self.ensure_editable()?;

        if cmd.quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if let Some(currency) = self.currency() {
            if currency != cmd.unit_price.currency {
                return Err(DomainError::invariant(format!(
                    "basket lines must share one currency ({} vs {})",
                    currency, cmd.unit_price.currency
                )));
            }
        }
        let merged = self
            .line(cmd.product_id, cmd.stockrecord_id)
            .map_or(0, |l| l.quantity);
        if merged.checked_add(cmd.quantity).is_none() {
            return Err(DomainError::validation("quantity overflow"));
        }

        Ok(vec![BasketEvent::LineAdded(LineAdded {
            basket_id: cmd.basket_id,
            product_id: cmd.product_id,
            stockrecord_id: cmd.stockrecord_id,
            quantity: cmd.quantity,
            unit_price: cmd.unit_price.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateLineQuantity) -> DomainResult<Vec<BasketEvent>> {
        self.ensure_created()?;
        self.ensure_basket_id(cmd.basket_id)?;
        self.ensure_editable()?;

        if self.line(cmd.product_id, cmd.stockrecord_id).is_none() {
            return Err(DomainError::not_found());
        }
        let event = if cmd.quantity == 0 {
            BasketEvent::LineRemoved(LineRemoved {
                basket_id: cmd.basket_id,
                product_id: cmd.product_id,
                stockrecord_id: cmd.stockrecord_id,
                occurred_at: cmd.occurred_at,
            })
        } else {
            BasketEvent::LineQuantityChanged(LineQuantityChanged {
                basket_id: cmd.basket_id,
                product_id: cmd.product_id,
                stockrecord_id: cmd.stockrecord_id,
                quantity: cmd.quantity,
                occurred_at: cmd.occurred_at,
            })
        };
        Ok(vec![event])
    }

    fn handle_status(
        &self,
        cmd: &ChangeStatus,
        from: BasketStatus,
        to: BasketStatus,
    ) -> DomainResult<Vec<BasketEvent>> {
        self.ensure_created()?;
        self.ensure_basket_id(cmd.basket_id)?;
        if self.status != from {
            return Err(DomainError::invariant(format!(
                "cannot move basket from {:?} to {:?}",
                self.status, to
            )));
        }
        Ok(vec![BasketEvent::StatusChanged(StatusChanged {
            basket_id: cmd.basket_id,
            status: to,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit(&self, cmd: &ChangeStatus) -> DomainResult<Vec<BasketEvent>> {
        self.ensure_created()?;
        self.ensure_basket_id(cmd.basket_id)?;
        if self.status == BasketStatus::Submitted {
            return Err(DomainError::conflict("basket has already been submitted"));
        }
        if self.is_empty() {
            return Err(DomainError::validation("Empty baskets cannot be submitted"));
        }
        Ok(vec![BasketEvent::StatusChanged(StatusChanged {
            basket_id: cmd.basket_id,
            status: BasketStatus::Submitted,
            occurred_at: cmd.occurred_at,
        })])
    }
}
