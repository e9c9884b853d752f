//! PN532 tag reader over I²C, exposed as a [`MediumPort`].
//!
//! Only the handful of chip commands the dock needs: SAM configuration at
//! boot, passive-target enumeration for presence, and data-exchange reads
//! and writes of single 4-byte tag pages. Transport failures surface as
//! `false` per the port contract; retry policy lives in the record store.

#![cfg(feature = "espidf")]

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::i2c::I2cDriver;
use log::{debug, info, warn};

use crate::ports::MediumPort;
use crate::record::Page;

const PN532_I2C_ADDR: u8 = 0x24;

const HOST_TO_CHIP: u8 = 0xD4;
const CHIP_TO_HOST: u8 = 0xD5;

const CMD_SAM_CONFIGURATION: u8 = 0x14;
const CMD_IN_LIST_PASSIVE_TARGET: u8 = 0x4A;
const CMD_IN_DATA_EXCHANGE: u8 = 0x40;

/// NTAG-family single-page commands tunnelled through InDataExchange.
const TAG_CMD_READ: u8 = 0x30;
const TAG_CMD_WRITE: u8 = 0xA2;

/// 106 kbps ISO14443 Type A.
const BAUD_TYPE_A: u8 = 0x00;

const ACK_FRAME: [u8; 6] = [0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00];

/// Ready-bit polls before a command is declared lost.
const READY_POLLS: u32 = 40;
const READY_POLL_MS: u32 = 5;

const I2C_TIMEOUT: u32 = esp_idf_hal::delay::BLOCK;

pub struct Pn532Reader<'d> {
    i2c: I2cDriver<'d>,
    /// Response scratch: longest reply we parse is a passive-target listing.
    scratch: [u8; 64],
}

impl<'d> Pn532Reader<'d> {
    /// Configure the chip's SAM for normal (direct) operation. Fails if the
    /// chip never raises its ready bit, which on this board means it is
    /// absent or unpowered.
    pub fn new(i2c: I2cDriver<'d>) -> Result<Self, crate::error::Error> {
        let mut reader = Self {
            i2c,
            scratch: [0; 64],
        };
        // mode=normal, timeout=50 ms units, use IRQ pin=no
        if !reader.transact(&[CMD_SAM_CONFIGURATION, 0x01, 0x14, 0x00]) {
            return Err(crate::error::Error::Init("tag reader not responding"));
        }
        info!("tag reader configured");
        Ok(reader)
    }

    /// Send one command frame and read its response into the scratch
    /// buffer. Returns false on any transport or framing failure.
    fn transact(&mut self, cmd: &[u8]) -> bool {
        if !self.write_command(cmd) {
            return false;
        }
        self.read_response(cmd[0])
    }

    fn write_command(&mut self, cmd: &[u8]) -> bool {
        // 00 00 FF LEN LCS D4 <cmd...> DCS 00
        let mut frame = [0u8; 64];
        let len = cmd.len() + 1;
        frame[0] = 0x00;
        frame[1] = 0x00;
        frame[2] = 0xFF;
        frame[3] = len as u8;
        frame[4] = (!(len as u8)).wrapping_add(1);
        frame[5] = HOST_TO_CHIP;
        frame[6..6 + cmd.len()].copy_from_slice(cmd);
        let sum = cmd
            .iter()
            .fold(HOST_TO_CHIP, |acc, b| acc.wrapping_add(*b));
        frame[6 + cmd.len()] = (!sum).wrapping_add(1);
        frame[7 + cmd.len()] = 0x00;

        if self
            .i2c
            .write(PN532_I2C_ADDR, &frame[..8 + cmd.len()], I2C_TIMEOUT)
            .is_err()
        {
            warn!("reader: command write failed");
            return false;
        }

        self.read_ack()
    }

    fn wait_ready(&mut self) -> bool {
        let mut status = [0u8; 1];
        for _ in 0..READY_POLLS {
            if self
                .i2c
                .read(PN532_I2C_ADDR, &mut status, I2C_TIMEOUT)
                .is_ok()
                && status[0] & 0x01 != 0
            {
                return true;
            }
            FreeRtos::delay_ms(READY_POLL_MS);
        }
        false
    }

    fn read_ack(&mut self) -> bool {
        if !self.wait_ready() {
            debug!("reader: no ack ready bit");
            return false;
        }
        // Ready byte is prepended on I2C reads.
        let mut buf = [0u8; 7];
        if self.i2c.read(PN532_I2C_ADDR, &mut buf, I2C_TIMEOUT).is_err() {
            return false;
        }
        buf[1..7] == ACK_FRAME
    }

    /// Read and validate a response frame for `cmd`; payload (after the
    /// direction byte and echoed command) lands in the scratch buffer.
    /// Returns false for framing or checksum mismatches.
    fn read_response(&mut self, cmd: u8) -> bool {
        if !self.wait_ready() {
            debug!("reader: no response ready bit");
            return false;
        }
        let mut buf = [0u8; 64];
        if self.i2c.read(PN532_I2C_ADDR, &mut buf, I2C_TIMEOUT).is_err() {
            return false;
        }

        // buf[0] ready byte, then 00 00 FF LEN LCS D5 CMD+1 <data> DCS 00
        if buf[1] != 0x00 || buf[2] != 0x00 || buf[3] != 0xFF {
            return false;
        }
        let len = buf[4] as usize;
        if buf[4].wrapping_add(buf[5]) != 0 || len < 2 || len > 56 {
            return false;
        }
        if buf[6] != CHIP_TO_HOST || buf[7] != cmd + 1 {
            return false;
        }
        let body = &buf[6..6 + len];
        let sum: u8 = body.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        if sum.wrapping_add(buf[6 + len]) != 0 {
            return false;
        }

        self.scratch[..len - 2].copy_from_slice(&buf[8..6 + len]);
        true
    }

    /// One passive-target enumeration round. True iff exactly one Type A
    /// target with a 7-byte identifier answered.
    fn list_target(&mut self) -> bool {
        if !self.transact(&[CMD_IN_LIST_PASSIVE_TARGET, 0x01, BAUD_TYPE_A]) {
            return false;
        }
        // NbTg, Tg, SENS_RES(2), SEL_RES, NFCIDLength, NFCID...
        self.scratch[0] == 1 && self.scratch[5] == 7
    }
}

impl MediumPort for Pn532Reader<'_> {
    fn tag_present(&mut self) -> bool {
        self.list_target()
    }

    fn read_page(&mut self, page: u8, buf: &mut Page) -> bool {
        if !self.transact(&[CMD_IN_DATA_EXCHANGE, 0x01, TAG_CMD_READ, page]) {
            return false;
        }
        // status, then a 16-byte read of which the first 4 are the page
        if self.scratch[0] != 0x00 {
            debug!("reader: read page {page} status {:#04x}", self.scratch[0]);
            return false;
        }
        buf.copy_from_slice(&self.scratch[1..5]);
        true
    }

    fn write_page(&mut self, page: u8, data: &Page) -> bool {
        let ok = self.transact(&[
            CMD_IN_DATA_EXCHANGE,
            0x01,
            TAG_CMD_WRITE,
            page,
            data[0],
            data[1],
            data[2],
            data[3],
        ]) && self.scratch[0] == 0x00;
        if !ok {
            debug!("reader: write page {page} failed");
        }
        ok
    }

    fn reacquire(&mut self) {
        // Re-select the target; a fresh listing restarts the anticollision
        // sequence after a torn transaction.
        let _ = self.list_target();
    }
}
