use crate::infra::{parse_date, InMemoryExpenseRepository, InMemoryShipmentRepository};
use chrono::{Local, NaiveDate};
use clap::Args;
use ledgerdesk::error::AppError;
use ledgerdesk::workflows::expenses::{
    extract_receipt_fields, ActorRole, ExpenseCsvImporter, ExpenseRuleType, ExpenseService,
    NewCategory, NewExpense, NewRule,
};
use ledgerdesk::workflows::shipments::{
    build_custom_allocations, AllocationMethod, AllocationRequest, CustomsEvent, CustomsEventKind,
    NewShipment, PurchaseOrderLine, ShipmentCosts, ShipmentService,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Expense date used throughout the walkthrough (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) incurred_on: Option<NaiveDate>,
    /// Optional expense CSV export to load into the demo ledger
    #[arg(long)]
    pub(crate) import_csv: Option<PathBuf>,
    /// Skip the import-shipment costing portion of the demo
    #[arg(long)]
    pub(crate) skip_shipment: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ReceiptScanArgs {
    /// Path to a file holding raw OCR text from a scanned receipt
    pub(crate) path: PathBuf,
}

pub(crate) fn run_receipt_scan(args: ReceiptScanArgs) -> Result<(), AppError> {
    let text = std::fs::read_to_string(&args.path)?;
    let suggestions = extract_receipt_fields(&text);

    println!("Receipt scan: {}", args.path.display());
    println!("- vendor: {}", suggestions.vendor.as_deref().unwrap_or("(none)"));
    println!("- amount: {}", suggestions.amount.as_deref().unwrap_or("(none)"));
    println!("- date: {}", suggestions.date.as_deref().unwrap_or("(none)"));
    println!(
        "- description: {}",
        suggestions.description.as_deref().unwrap_or("(none)")
    );

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let incurred_on = args
        .incurred_on
        .unwrap_or_else(|| Local::now().date_naive());

    println!("Back office demo");

    let repository = Arc::new(InMemoryExpenseRepository::default());
    let service = ExpenseService::new(repository, 50);

    let travel = match service.create_category(NewCategory {
        name: "Travel".to_string(),
        account_code: "6200".to_string(),
        is_active: true,
    }) {
        Ok(category) => category,
        Err(err) => {
            println!("  Category setup failed: {}", err);
            return Ok(());
        }
    };

    for (name, rule_type, conditions) in [
        (
            "Spending cap",
            ExpenseRuleType::AmountLimit,
            r#"{"limit": 1000}"#,
        ),
        (
            "Blocked suppliers",
            ExpenseRuleType::VendorRestriction,
            r#"{"blocked": ["acme"]}"#,
        ),
        ("Manager sign-off", ExpenseRuleType::ApprovalRequired, "{}"),
    ] {
        if let Err(err) = service.create_rule(NewRule {
            name: name.to_string(),
            rule_type,
            conditions: conditions.to_string(),
            actions: "{}".to_string(),
            priority: 1,
            is_active: true,
        }) {
            println!("  Rule setup failed: {}", err);
            return Ok(());
        }
    }

    if let Some(path) = args.import_csv.as_deref() {
        let categories = match service.categories() {
            Ok(categories) => categories,
            Err(err) => {
                println!("  Category lookup failed: {}", err);
                return Ok(());
            }
        };
        let drafts = ExpenseCsvImporter::from_path(path, &categories)?;
        match service.create_expenses(drafts) {
            Ok(imported) => println!("- imported {} draft expense(s) from {}", imported.len(), path.display()),
            Err(err) => println!("- import failed: {}", err),
        }
    }

    println!("\nPolicy checks");
    demo_blocked_submit(
        &service,
        "Acme Industrial",
        250.0,
        incurred_on,
        "restricted vendor",
    );
    demo_blocked_submit(
        &service,
        "Initech",
        1500.0,
        incurred_on,
        "amount over the cap",
    );

    let compliant = match service.create_expense(NewExpense {
        category_id: Some(travel.id.clone()),
        vendor_name: Some("Initech".to_string()),
        description: "Client site travel".to_string(),
        total_amount: 480.0,
        incurred_on,
    }) {
        Ok(expense) => expense,
        Err(err) => {
            println!("  Expense setup failed: {}", err);
            return Ok(());
        }
    };

    match service.submit_expense(&compliant.id) {
        Ok(expense) => println!(
            "- {} submitted ({} {:.2})",
            expense.id.0,
            expense.vendor_name.as_deref().unwrap_or("unknown vendor"),
            expense.total_amount
        ),
        Err(err) => println!("- submission unexpectedly blocked: {}", err),
    }

    match service.approve_expense(&compliant.id, ActorRole::Employee) {
        Ok(_) => println!("- employee approval unexpectedly permitted"),
        Err(err) => println!("- employee approval blocked: {}", err),
    }

    match service.approve_expense(&compliant.id, ActorRole::Accountant) {
        Ok(expense) => println!("- accountant approved {}", expense.id.0),
        Err(err) => println!("- accountant approval failed: {}", err),
    }

    match service.journal_entries() {
        Ok(entries) => {
            println!("\nJournal entries");
            for entry in entries {
                println!("- {} ({}) posted {}", entry.id.0, entry.memo, entry.posted_on);
                for line in &entry.lines {
                    println!(
                        "    {} | debit {:.2} | credit {:.2}",
                        line.account, line.debit, line.credit
                    );
                }
            }
        }
        Err(err) => println!("  Journal unavailable: {}", err),
    }

    println!("\nReceipt capture");
    let sample = "Corner Cafe\n123 Main St\nEspresso 3.50\nSubtotal $10.00\nTotal $12.50\n2026-03-15\n";
    let suggestions = extract_receipt_fields(sample);
    println!("- vendor guess: {}", suggestions.vendor.as_deref().unwrap_or("(none)"));
    println!("- amount guess: {}", suggestions.amount.as_deref().unwrap_or("(none)"));
    println!("- date guess: {}", suggestions.date.as_deref().unwrap_or("(none)"));

    match service.export_csv() {
        Ok(csv) => {
            println!("\nCSV export");
            for line in csv.lines().take(5) {
                println!("  {}", line);
            }
        }
        Err(err) => println!("  Export unavailable: {}", err),
    }

    if args.skip_shipment {
        return Ok(());
    }

    println!("\nImport shipment costing");
    let shipments = ShipmentService::new(Arc::new(InMemoryShipmentRepository::default()));

    let shipment = match shipments.create(NewShipment {
        reference: "PO-7741".to_string(),
        supplier: "Shenzhen Components Ltd".to_string(),
        carrier: "Maersk".to_string(),
        expected_arrival: Some(incurred_on),
        lines: vec![
            PurchaseOrderLine {
                id: "line-1".to_string(),
                description: "Aluminium housings".to_string(),
                unit_value: 12.0,
                quantity: 500,
            },
            PurchaseOrderLine {
                id: "line-2".to_string(),
                description: "Fastener kits".to_string(),
                unit_value: 4.0,
                quantity: 500,
            },
        ],
        costs: ShipmentCosts {
            freight: 1800.0,
            insurance: 240.0,
            customs_fees: 410.0,
            storage: 150.0,
            other: 0.0,
        },
    }) {
        Ok(shipment) => shipment,
        Err(err) => {
            println!("  Shipment setup failed: {}", err);
            return Ok(());
        }
    };
    println!(
        "- {} from {} via {} (landed cost {:.2})",
        shipment.reference,
        shipment.supplier,
        shipment.carrier,
        shipment.costs.landed_total()
    );

    for (kind, location) in [
        (CustomsEventKind::Inspection, "Rotterdam"),
        (CustomsEventKind::Cleared, "Rotterdam"),
    ] {
        match shipments.append_customs_event(
            &shipment.id,
            CustomsEvent {
                kind,
                occurred_on: incurred_on,
                location: location.to_string(),
                notes: None,
            },
        ) {
            Ok(updated) => println!("- customs event {:?} -> status {}", kind, updated.status.label()),
            Err(err) => println!("- customs event failed: {}", err),
        }
    }

    let shares = HashMap::from([("line-1".to_string(), 70.0), ("line-2".to_string(), 30.0)]);
    let custom = build_custom_allocations(&shipment.lines, &shares);
    match shipments.allocate_costs(
        &shipment.id,
        AllocationRequest {
            allocation_method: AllocationMethod::Custom,
            custom_allocations: Some(custom),
        },
    ) {
        Ok(allocation) => {
            println!("- allocation ({})", allocation.method.label());
            for line in &allocation.lines {
                println!(
                    "    {} | {:.1}% | {:.2}",
                    line.line_id, line.share_pct, line.amount
                );
            }
        }
        Err(err) => println!("- allocation failed: {}", err),
    }

    match shipments.stats() {
        Ok(stats) => println!(
            "- stats: {} shipments, {} cleared, landed cost {:.2}, {} pending allocation",
            stats.total, stats.cleared, stats.total_landed_cost, stats.pending_allocation
        ),
        Err(err) => println!("- stats unavailable: {}", err),
    }

    Ok(())
}

fn demo_blocked_submit<R>(
    service: &ExpenseService<R>,
    vendor: &str,
    amount: f64,
    incurred_on: NaiveDate,
    label: &str,
) where
    R: ledgerdesk::workflows::expenses::ExpenseRepository + 'static,
{
    let created = service.create_expense(NewExpense {
        category_id: None,
        vendor_name: Some(vendor.to_string()),
        description: format!("Demo expense ({label})"),
        total_amount: amount,
        incurred_on,
    });

    match created {
        Ok(expense) => match service.submit_expense(&expense.id) {
            Ok(_) => println!("- {} submission unexpectedly permitted", label),
            Err(err) => println!("- {} blocked: {}", label, err),
        },
        Err(err) => println!("- could not create {} expense: {}", label, err),
    }
}
